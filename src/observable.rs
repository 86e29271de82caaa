//! Observable values. Every field the rendering layer watches is a
//! [`Property`]; one-off events such as undeployed-set deltas go through a
//! [`Signal`].

use std::cell::{Cell, RefCell};
use std::fmt;

pub type ListenerId = u64;

type Listener<E> = Box<dyn FnMut(&E)>;

/// A list of listeners for events of type `E`.
///
/// Subscribing only needs a shared reference so observers can attach to a
/// value they can read but not write. Listeners must not subscribe to the
/// signal that is currently notifying them.
pub struct Signal<E> {
    listeners: RefCell<Vec<(ListenerId, Listener<E>)>>,
    next_id: Cell<ListenerId>,
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn emit(&mut self, event: &E) {
        for (_, listener) in self.listeners.get_mut().iter_mut() {
            listener(event);
        }
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

/// A value that tells its listeners when it changes.
pub struct Property<T> {
    value: T,
    changed: Signal<Change<T>>,
}

impl<T: Clone + PartialEq> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: Signal::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Stores `value`. Listeners are called once, and only if the value
    /// differs from the previous one. Returns whether it changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        let old = std::mem::replace(&mut self.value, value);
        if self.changed.listener_count() > 0 {
            let change = Change {
                old,
                new: self.value.clone(),
            };
            self.changed.emit(&change);
        }
        true
    }

    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.value.clone();
        f(&mut next);
        self.set(next)
    }

    pub fn subscribe(&self, listener: impl FnMut(&Change<T>) + 'static) -> ListenerId {
        self.changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.changed.unsubscribe(id)
    }
}

impl<T: Clone + PartialEq + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.value)
            .field("listeners", &self.changed.listener_count())
            .finish()
    }
}
