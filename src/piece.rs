//! Piece catalog: colours, the 21 polyominoes, rotations and the transform
//! that turns a selected piece into the board cells it covers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::state::Team;

pub const BOARD_SIZE: i32 = 20;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    /// Turn order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    pub fn next(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Green,
            Color::Green => Color::Yellow,
            Color::Yellow => Color::Red,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
            Color::Green => 2,
            Color::Yellow => 3,
        }
    }

    /// Teams alternate along the turn order.
    pub fn team(self) -> Team {
        match self {
            Color::Red | Color::Green => Team::One,
            Color::Blue | Color::Yellow => Team::Two,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Blue => "BLUE",
            Color::Green => "GREEN",
            Color::Yellow => "YELLOW",
        }
    }

    fn cell_char(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Yellow => 'Y',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::UnknownColor(s.to_string()))
    }
}

/// Quarter turns clockwise. Composition adds the quarter turns.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rotation {
    None = 0,
    Right = 1,
    Mirror = 2,
    Left = 3,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::None, Rotation::Right, Rotation::Mirror, Rotation::Left];

    fn from_quarters(quarters: u8) -> Rotation {
        match quarters % 4 {
            0 => Rotation::None,
            1 => Rotation::Right,
            2 => Rotation::Mirror,
            _ => Rotation::Left,
        }
    }

    pub fn rotate(self, by: Rotation) -> Rotation {
        Rotation::from_quarters(self as u8 + by as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Rotation::None => "NONE",
            Rotation::Right => "RIGHT",
            Rotation::Mirror => "MIRROR",
            Rotation::Left => "LEFT",
        }
    }

    fn apply(self, p: Coordinates) -> Coordinates {
        // Board y grows downwards, so RIGHT is clockwise on screen.
        match self {
            Rotation::None => p,
            Rotation::Right => Coordinates::new(-p.y, p.x),
            Rotation::Mirror => Coordinates::new(-p.x, -p.y),
            Rotation::Left => Coordinates::new(p.y, -p.x),
        }
    }
}

impl FromStr for Rotation {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rotation::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::UnknownRotation(s.to_string()))
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn neighbours(self) -> [Coordinates; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    pub fn diagonals(self) -> [Coordinates; 4] {
        [
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, 1),
            self.offset(-1, -1),
        ]
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceShape {
    Mono,
    Domino,
    TrioL,
    TrioI,
    TetroO,
    TetroT,
    TetroI,
    TetroL,
    TetroZ,
    PentoL,
    PentoT,
    PentoV,
    PentoS,
    PentoZ,
    PentoI,
    PentoP,
    PentoW,
    PentoU,
    PentoR,
    PentoX,
    PentoY,
}

/// Order in which `scroll` walks through the orientations of a shape.
const VARIANT_ORDER: [(Rotation, bool); 8] = [
    (Rotation::None, false),
    (Rotation::Right, false),
    (Rotation::Mirror, false),
    (Rotation::Left, false),
    (Rotation::None, true),
    (Rotation::Right, true),
    (Rotation::Mirror, true),
    (Rotation::Left, true),
];

impl PieceShape {
    pub const ALL: [PieceShape; 21] = [
        PieceShape::Mono,
        PieceShape::Domino,
        PieceShape::TrioL,
        PieceShape::TrioI,
        PieceShape::TetroO,
        PieceShape::TetroT,
        PieceShape::TetroI,
        PieceShape::TetroL,
        PieceShape::TetroZ,
        PieceShape::PentoL,
        PieceShape::PentoT,
        PieceShape::PentoV,
        PieceShape::PentoS,
        PieceShape::PentoZ,
        PieceShape::PentoI,
        PieceShape::PentoP,
        PieceShape::PentoW,
        PieceShape::PentoU,
        PieceShape::PentoR,
        PieceShape::PentoX,
        PieceShape::PentoY,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PieceShape::Mono => "MONO",
            PieceShape::Domino => "DOMINO",
            PieceShape::TrioL => "TRIO_L",
            PieceShape::TrioI => "TRIO_I",
            PieceShape::TetroO => "TETRO_O",
            PieceShape::TetroT => "TETRO_T",
            PieceShape::TetroI => "TETRO_I",
            PieceShape::TetroL => "TETRO_L",
            PieceShape::TetroZ => "TETRO_Z",
            PieceShape::PentoL => "PENTO_L",
            PieceShape::PentoT => "PENTO_T",
            PieceShape::PentoV => "PENTO_V",
            PieceShape::PentoS => "PENTO_S",
            PieceShape::PentoZ => "PENTO_Z",
            PieceShape::PentoI => "PENTO_I",
            PieceShape::PentoP => "PENTO_P",
            PieceShape::PentoW => "PENTO_W",
            PieceShape::PentoU => "PENTO_U",
            PieceShape::PentoR => "PENTO_R",
            PieceShape::PentoX => "PENTO_X",
            PieceShape::PentoY => "PENTO_Y",
        }
    }

    /// Cells of the untransformed shape, aligned to the origin.
    fn base(self) -> &'static [(i32, i32)] {
        match self {
            PieceShape::Mono => &[(0, 0)],
            PieceShape::Domino => &[(0, 0), (1, 0)],
            PieceShape::TrioL => &[(0, 0), (0, 1), (1, 1)],
            PieceShape::TrioI => &[(0, 0), (0, 1), (0, 2)],
            PieceShape::TetroO => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            PieceShape::TetroT => &[(0, 0), (1, 0), (2, 0), (1, 1)],
            PieceShape::TetroI => &[(0, 0), (0, 1), (0, 2), (0, 3)],
            PieceShape::TetroL => &[(0, 0), (0, 1), (0, 2), (1, 2)],
            PieceShape::TetroZ => &[(0, 0), (1, 0), (1, 1), (2, 1)],
            PieceShape::PentoL => &[(0, 0), (0, 1), (0, 2), (0, 3), (1, 3)],
            PieceShape::PentoT => &[(0, 0), (1, 0), (2, 0), (1, 1), (1, 2)],
            PieceShape::PentoV => &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)],
            PieceShape::PentoS => &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1)],
            PieceShape::PentoZ => &[(0, 0), (1, 0), (1, 1), (1, 2), (2, 2)],
            PieceShape::PentoI => &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)],
            PieceShape::PentoP => &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)],
            PieceShape::PentoW => &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)],
            PieceShape::PentoU => &[(0, 0), (0, 1), (1, 1), (2, 1), (2, 0)],
            PieceShape::PentoR => &[(0, 1), (1, 1), (1, 0), (2, 0), (1, 2)],
            PieceShape::PentoX => &[(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)],
            PieceShape::PentoY => &[(0, 1), (1, 0), (1, 1), (1, 2), (1, 3)],
        }
    }

    pub fn size(self) -> usize {
        self.base().len()
    }

    /// Rotates, optionally flips along the vertical axis and re-aligns the
    /// result so its smallest x and y are both 0.
    pub fn transform(self, rotation: Rotation, flipped: bool) -> BTreeSet<Coordinates> {
        let moved: Vec<Coordinates> = self
            .base()
            .iter()
            .map(|&(x, y)| {
                let p = rotation.apply(Coordinates::new(x, y));
                if flipped { Coordinates::new(-p.x, p.y) } else { p }
            })
            .collect();
        let min_x = moved.iter().map(|p| p.x).min().unwrap_or(0);
        let min_y = moved.iter().map(|p| p.y).min().unwrap_or(0);
        moved
            .into_iter()
            .map(|p| p.offset(-min_x, -min_y))
            .collect()
    }

    /// Orientations that produce distinct cell sets, in scroll order.
    pub fn variants(self) -> Vec<(Rotation, bool)> {
        let mut seen: Vec<BTreeSet<Coordinates>> = Vec::with_capacity(8);
        let mut variants = Vec::with_capacity(8);
        for (rotation, flipped) in VARIANT_ORDER {
            let cells = self.transform(rotation, flipped);
            if !seen.contains(&cells) {
                seen.push(cells);
                variants.push((rotation, flipped));
            }
        }
        variants
    }
}

impl fmt::Display for PieceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PieceShape {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PieceShape::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::UnknownShape(s.to_string()))
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    pub color: Color,
    pub kind: PieceShape,
    pub rotation: Rotation,
    pub is_flipped: bool,
    pub position: Coordinates,
}

impl Piece {
    pub fn new(color: Color, kind: PieceShape) -> Self {
        Self {
            color,
            kind,
            rotation: Rotation::None,
            is_flipped: false,
            position: Coordinates::default(),
        }
    }

    pub fn at(mut self, position: Coordinates) -> Self {
        self.position = position;
        self
    }

    /// Cells relative to the origin.
    pub fn shape(&self) -> BTreeSet<Coordinates> {
        self.kind.transform(self.rotation, self.is_flipped)
    }

    /// Board cells the piece covers when its top-left corner is at `position`.
    pub fn coordinates(&self) -> BTreeSet<Coordinates> {
        self.shape()
            .into_iter()
            .map(|p| p.offset(self.position.x, self.position.y))
            .collect()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{} at ({}, {})",
            self.color,
            self.kind,
            self.rotation.name(),
            if self.is_flipped { " flipped" } else { "" },
            self.position.x,
            self.position.y
        )
    }
}

pub(crate) fn cell_char(cell: Option<Color>) -> char {
    cell.map(Color::cell_char).unwrap_or('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pts: &[(i32, i32)]) -> BTreeSet<Coordinates> {
        pts.iter().map(|&(x, y)| Coordinates::new(x, y)).collect()
    }

    #[test]
    fn right_four_times_is_identity() {
        for start in Rotation::ALL {
            let mut r = start;
            for _ in 0..4 {
                r = r.rotate(Rotation::Right);
            }
            assert_eq!(r, start);
        }
    }

    #[test]
    fn rotation_composition_table() {
        assert_eq!(Rotation::Right.rotate(Rotation::Right), Rotation::Mirror);
        assert_eq!(Rotation::Right.rotate(Rotation::Left), Rotation::None);
        assert_eq!(Rotation::Mirror.rotate(Rotation::Mirror), Rotation::None);
        assert_eq!(Rotation::Left.rotate(Rotation::Mirror), Rotation::Right);
        assert_eq!(Rotation::None.rotate(Rotation::Left), Rotation::Left);
    }

    #[test]
    fn color_cycle_wraps() {
        assert_eq!(Color::Red.next(), Color::Blue);
        assert_eq!(Color::Yellow.next(), Color::Red);
        let mut c = Color::Green;
        for _ in 0..4 {
            c = c.next();
        }
        assert_eq!(c, Color::Green);
    }

    #[test]
    fn teams_alternate_along_turn_order() {
        for c in Color::ALL {
            assert_ne!(c.team(), c.next().team());
        }
    }

    #[test]
    fn transform_is_deterministic_and_keeps_size() {
        for shape in PieceShape::ALL {
            for (rotation, flipped) in VARIANT_ORDER {
                let a = shape.transform(rotation, flipped);
                let b = shape.transform(rotation, flipped);
                assert_eq!(a, b);
                assert_eq!(a.len(), shape.size());
                assert_eq!(a.iter().map(|p| p.x).min(), Some(0));
                assert_eq!(a.iter().map(|p| p.y).min(), Some(0));
            }
        }
    }

    #[test]
    fn right_rotation_turns_a_line_sideways() {
        let vertical = PieceShape::TrioI.transform(Rotation::None, false);
        let horizontal = PieceShape::TrioI.transform(Rotation::Right, false);
        assert_eq!(vertical, cells(&[(0, 0), (0, 1), (0, 2)]));
        assert_eq!(horizontal, cells(&[(0, 0), (1, 0), (2, 0)]));
    }

    #[test]
    fn flip_mirrors_horizontally() {
        let flipped = PieceShape::TrioL.transform(Rotation::None, true);
        assert_eq!(flipped, cells(&[(1, 0), (1, 1), (0, 1)]));
    }

    #[test]
    fn variant_counts_follow_symmetry() {
        assert_eq!(PieceShape::Mono.variants().len(), 1);
        assert_eq!(PieceShape::TetroO.variants().len(), 1);
        assert_eq!(PieceShape::PentoX.variants().len(), 1);
        assert_eq!(PieceShape::TetroI.variants().len(), 2);
        assert_eq!(PieceShape::TetroT.variants().len(), 4);
        assert_eq!(PieceShape::PentoL.variants().len(), 8);
    }

    #[test]
    fn coordinates_are_shifted_by_position() {
        let piece = Piece::new(Color::Blue, PieceShape::Domino).at(Coordinates::new(3, 7));
        assert_eq!(piece.coordinates(), cells(&[(3, 7), (4, 7)]));
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("trio_l".parse::<PieceShape>().ok(), Some(PieceShape::TrioL));
        assert_eq!("Yellow".parse::<Color>().ok(), Some(Color::Yellow));
        assert_eq!("mirror".parse::<Rotation>().ok(), Some(Rotation::Mirror));
        assert!(matches!(
            "PURPLE".parse::<Color>(),
            Err(ClientError::UnknownColor(_))
        ));
    }

    #[test]
    fn serde_uses_server_names() {
        let json = serde_json::to_string(&PieceShape::PentoY).unwrap();
        assert_eq!(json, "\"PENTO_Y\"");
        let piece: Piece = serde_json::from_str(
            r#"{"color":"GREEN","kind":"TETRO_Z","rotation":"LEFT","isFlipped":true,"position":{"x":1,"y":2}}"#,
        )
        .unwrap();
        assert_eq!(piece.kind, PieceShape::TetroZ);
        assert!(piece.is_flipped);
    }
}
