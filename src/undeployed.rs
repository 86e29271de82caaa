use serde::Serialize;
use tracing::debug;

use crate::observable::{ListenerId, Property, Signal};
use crate::piece::{Color, PieceShape};
use crate::selection::PieceSelection;

/// What a snapshot changed in one colour's undeployed set.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UndeployedDelta {
    pub color: Color,
    pub removed: Vec<PieceShape>,
    pub added: Vec<PieceShape>,
}

impl UndeployedDelta {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Per colour: shapes not yet placed, the subset the rules engine says is
/// placeable right now, and whether the colour is stuck.
pub struct UndeployedPieceSet {
    shapes: [Vec<PieceShape>; 4],
    legal: [Property<Vec<PieceShape>>; 4],
    unplayable: [Property<bool>; 4],
    deltas: Signal<UndeployedDelta>,
}

impl UndeployedPieceSet {
    pub fn new() -> Self {
        Self {
            shapes: Default::default(),
            legal: std::array::from_fn(|_| Property::new(Vec::new())),
            unplayable: std::array::from_fn(|_| Property::new(false)),
            deltas: Signal::new(),
        }
    }

    /// Remaining shapes of `color`, oldest first.
    pub fn shapes(&self, color: Color) -> &[PieceShape] {
        &self.shapes[color.index()]
    }

    pub fn legal(&self, color: Color) -> &Property<Vec<PieceShape>> {
        &self.legal[color.index()]
    }

    pub fn unplayable(&self, color: Color) -> &Property<bool> {
        &self.unplayable[color.index()]
    }

    pub fn subscribe_deltas(&self, listener: impl FnMut(&UndeployedDelta) + 'static) -> ListenerId {
        self.deltas.subscribe(listener)
    }

    pub fn unsubscribe_deltas(&self, id: ListenerId) -> bool {
        self.deltas.unsubscribe(id)
    }

    /// Replaces the set with the one from a snapshot. Shapes that stay keep
    /// their position, new ones go to the end. Listeners only hear about
    /// non-empty deltas.
    pub fn replace(&mut self, color: Color, incoming: &[PieceShape]) -> UndeployedDelta {
        let current = &mut self.shapes[color.index()];
        let removed: Vec<PieceShape> = current
            .iter()
            .copied()
            .filter(|s| !incoming.contains(s))
            .collect();
        let mut added: Vec<PieceShape> = Vec::new();
        for shape in incoming {
            if !current.contains(shape) && !added.contains(shape) {
                added.push(*shape);
            }
        }
        current.retain(|s| incoming.contains(s));
        current.extend(added.iter().copied());

        let delta = UndeployedDelta {
            color,
            removed,
            added,
        };
        if !delta.is_empty() {
            debug!(%color, removed = delta.removed.len(), added = delta.added.len(), "undeployed pieces changed");
            let remaining = current.clone();
            self.legal[color.index()].update(|legal| legal.retain(|s| remaining.contains(s)));
            self.deltas.emit(&delta);
        }
        delta
    }

    /// Stores the legal subset computed by the rules engine, restricted to
    /// shapes still undeployed and ordered like the undeployed set.
    pub fn set_legal(&mut self, color: Color, legal: &[PieceShape]) -> bool {
        let ordered: Vec<PieceShape> = self.shapes[color.index()]
            .iter()
            .copied()
            .filter(|s| legal.contains(s))
            .collect();
        self.legal[color.index()].set(ordered)
    }

    /// Whether the piece may be selected, hovered or clicked.
    pub fn is_selectable(&self, color: Color, shape: PieceShape) -> bool {
        self.legal[color.index()].get().contains(&shape)
    }

    /// The shape to select for `color` when the current selection is not one
    /// of its legal shapes: the most recently added legal one.
    pub fn auto_select_candidate(&self, color: Color, selection: &PieceSelection) -> Option<PieceShape> {
        let legal = self.legal[color.index()].get();
        if *selection.color().get() == color && legal.contains(selection.shape().get()) {
            return None;
        }
        legal.last().copied()
    }

    /// Updates the unplayable flags after the turn moved from
    /// `(previous_turn, previous_color)` to `(turn, active_color)`.
    pub fn on_turn_boundary(
        &mut self,
        previous_turn: u32,
        turn: u32,
        previous_color: Color,
        active_color: Color,
    ) {
        if turn == 0 {
            for flag in self.unplayable.iter_mut() {
                flag.set(false);
            }
            return;
        }
        if previous_turn < turn && previous_color != active_color {
            // Every colour between the two was skipped by the server.
            let mut skipped = previous_color.next();
            while skipped != active_color {
                self.unplayable[skipped.index()].set(true);
                skipped = skipped.next();
            }
        }
        let stuck = self.legal[active_color.index()].get().is_empty();
        if stuck {
            debug!(color = %active_color, "no piece can be placed");
        }
        self.unplayable[active_color.index()].set(stuck);
    }

    /// Unplayable flags of all colours, in turn order.
    pub fn unplayable_flags(&self) -> [bool; 4] {
        Color::ALL.map(|c| *self.unplayable[c.index()].get())
    }

    /// Puts back flags taken with [`unplayable_flags`](Self::unplayable_flags).
    pub fn restore_unplayable(&mut self, flags: [bool; 4]) {
        for color in Color::ALL {
            self.unplayable[color.index()].set(flags[color.index()]);
        }
    }

    pub fn clear(&mut self) {
        for color in Color::ALL {
            self.replace(color, &[]);
            self.unplayable[color.index()].set(false);
        }
    }
}

impl Default for UndeployedPieceSet {
    fn default() -> Self {
        Self::new()
    }
}
