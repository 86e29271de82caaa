use std::collections::BTreeSet;

use tracing::debug;

use crate::observable::Property;
use crate::piece::{Color, Coordinates, Piece, PieceShape, Rotation};

/// The piece the operator is about to place.
///
/// Observers subscribe to the properties of this one long-lived selection.
/// Choosing a different piece rewrites the values, so nothing has to be
/// rebound when the selection changes.
pub struct PieceSelection {
    color: Property<Color>,
    shape: Property<PieceShape>,
    rotation: Property<Rotation>,
    flipped: Property<bool>,
    anchor: Property<Coordinates>,
    cells: Property<BTreeSet<Coordinates>>,
}

impl PieceSelection {
    pub fn new(piece: Piece) -> Self {
        Self {
            color: Property::new(piece.color),
            shape: Property::new(piece.kind),
            rotation: Property::new(piece.rotation),
            flipped: Property::new(piece.is_flipped),
            anchor: Property::new(piece.position),
            cells: Property::new(piece.coordinates()),
        }
    }

    pub fn color(&self) -> &Property<Color> {
        &self.color
    }

    pub fn shape(&self) -> &Property<PieceShape> {
        &self.shape
    }

    pub fn rotation(&self) -> &Property<Rotation> {
        &self.rotation
    }

    pub fn flipped(&self) -> &Property<bool> {
        &self.flipped
    }

    pub fn anchor(&self) -> &Property<Coordinates> {
        &self.anchor
    }

    /// Board cells covered by the selection at its anchor.
    pub fn cells(&self) -> &Property<BTreeSet<Coordinates>> {
        &self.cells
    }

    pub fn piece(&self) -> Piece {
        Piece {
            color: *self.color.get(),
            kind: *self.shape.get(),
            rotation: *self.rotation.get(),
            is_flipped: *self.flipped.get(),
            position: *self.anchor.get(),
        }
    }

    fn recompute(&mut self) {
        let cells = self.piece().coordinates();
        self.cells.set(cells);
    }

    pub fn set_color(&mut self, color: Color) {
        self.color.set(color);
        self.recompute();
    }

    pub fn set_shape(&mut self, shape: PieceShape) {
        self.shape.set(shape);
        self.recompute();
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation.set(rotation);
        self.recompute();
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped.set(flipped);
        self.recompute();
    }

    pub fn set_anchor(&mut self, anchor: Coordinates) {
        self.anchor.set(anchor);
        self.recompute();
    }

    /// Replaces colour, shape, rotation and flip in one go. The anchor
    /// stays where the pointer is. Each field that actually changes
    /// notifies once and the cells are derived once at the end.
    pub fn select(&mut self, piece: Piece) {
        debug!(piece = %piece, "selecting piece");
        self.color.set(piece.color);
        self.shape.set(piece.kind);
        self.rotation.set(piece.rotation);
        self.flipped.set(piece.is_flipped);
        self.recompute();
    }

    /// Like [`select`](Self::select), but also moves the anchor to the
    /// piece's position.
    pub fn select_at(&mut self, piece: Piece) {
        self.anchor.set(piece.position);
        self.select(piece);
    }

    /// Selects an undeployed shape in its default orientation.
    pub fn select_shape(&mut self, color: Color, shape: PieceShape) {
        self.select(Piece::new(color, shape));
    }

    pub fn rotate(&mut self, by: Rotation) {
        let next = self.rotation.get().rotate(by);
        self.set_rotation(next);
    }

    pub fn flip(&mut self) {
        let next = !*self.flipped.get();
        self.set_flipped(next);
    }

    /// Steps through the distinct orientations of the selected shape;
    /// forward for a positive delta, backward for a negative one.
    pub fn scroll(&mut self, delta: f64) {
        if delta == 0.0 || delta.is_nan() {
            return;
        }
        let kind = *self.shape.get();
        let variants = kind.variants();
        let current = (*self.rotation.get(), *self.flipped.get());
        let index = variants
            .iter()
            .position(|v| *v == current)
            .or_else(|| {
                let cells = kind.transform(current.0, current.1);
                variants
                    .iter()
                    .position(|&(r, f)| kind.transform(r, f) == cells)
            })
            .unwrap_or(0);
        let len = variants.len();
        let next = if delta > 0.0 {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        let (rotation, flipped) = variants[next];
        self.rotation.set(rotation);
        self.flipped.set(flipped);
        self.recompute();
    }
}

impl Default for PieceSelection {
    fn default() -> Self {
        Self::new(Piece::new(Color::Red, PieceShape::Mono))
    }
}
