use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::piece::{cell_char, Color, Coordinates, Piece, PieceShape, BOARD_SIZE};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::One, Team::Two];

    pub fn index(self) -> usize {
        match self {
            Team::One => 0,
            Team::Two => 1,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    pub fn colors(self) -> [Color; 2] {
        match self {
            Team::One => [Color::Red, Color::Green],
            Team::Two => [Color::Blue, Color::Yellow],
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::One => f.write_str("ONE"),
            Team::Two => f.write_str("TWO"),
        }
    }
}

impl FromStr for Team {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONE" | "1" => Ok(Team::One),
            "TWO" | "2" => Ok(Team::Two),
            _ => Err(ClientError::UnknownTeam(s.to_string())),
        }
    }
}

/// 20x20 grid, row-major, `None` for empty cells.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Option<Color>>,
}

impl Board {
    pub const CORNERS: [Coordinates; 4] = [
        Coordinates::new(0, 0),
        Coordinates::new(BOARD_SIZE - 1, 0),
        Coordinates::new(0, BOARD_SIZE - 1),
        Coordinates::new(BOARD_SIZE - 1, BOARD_SIZE - 1),
    ];

    pub fn new() -> Self {
        Self {
            cells: vec![None; (BOARD_SIZE * BOARD_SIZE) as usize],
        }
    }

    pub fn in_bounds(at: Coordinates) -> bool {
        (0..BOARD_SIZE).contains(&at.x) && (0..BOARD_SIZE).contains(&at.y)
    }

    fn index(at: Coordinates) -> Option<usize> {
        if Self::in_bounds(at) {
            Some((at.y * BOARD_SIZE + at.x) as usize)
        } else {
            None
        }
    }

    /// Colour at `at`; out-of-bounds cells read as empty.
    pub fn get(&self, at: Coordinates) -> Option<Color> {
        Self::index(at)
            .and_then(|i| self.cells.get(i).copied())
            .flatten()
    }

    pub fn set(&mut self, at: Coordinates, color: Option<Color>) -> bool {
        match Self::index(at).and_then(|i| self.cells.get_mut(i)) {
            Some(cell) => {
                *cell = color;
                true
            }
            None => false,
        }
    }

    /// Writes the cells of `piece`. Cells off the board are skipped.
    pub fn place(&mut self, piece: &Piece) {
        for at in piece.coordinates() {
            self.set(at, Some(piece.color));
        }
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells.iter().filter(|c| **c == Some(color)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..BOARD_SIZE {
            let row: String = (0..BOARD_SIZE)
                .map(|x| cell_char(self.get(Coordinates::new(x, y))))
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Move {
    Set { piece: Piece },
    Skip { color: Color },
}

impl Move {
    pub fn color(&self) -> Color {
        match self {
            Move::Set { piece } => piece.color,
            Move::Skip { color } => *color,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Set { piece } => write!(f, "set {piece}"),
            Move::Skip { color } => write!(f, "skip {color}"),
        }
    }
}

fn all_colors() -> Vec<Color> {
    Color::ALL.to_vec()
}

/// Authoritative snapshot pushed by the server.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub turn: u32,
    #[serde(default)]
    pub round: u32,
    pub current_color: Color,
    #[serde(default = "all_colors")]
    pub valid_colors: Vec<Color>,
    pub start_piece: PieceShape,
    #[serde(default)]
    pub board: Board,
    /// Remaining shapes per colour, oldest first.
    #[serde(default)]
    pub undeployed: BTreeMap<Color, Vec<PieceShape>>,
    #[serde(default)]
    pub last_move: Option<Move>,
}

impl GameState {
    /// Opening position: empty board, every colour holds every shape.
    pub fn new(start_piece: PieceShape) -> Self {
        Self {
            turn: 0,
            round: 1,
            current_color: Color::Red,
            valid_colors: all_colors(),
            start_piece,
            board: Board::new(),
            undeployed: Color::ALL
                .into_iter()
                .map(|c| (c, PieceShape::ALL.to_vec()))
                .collect(),
            last_move: None,
        }
    }

    pub fn undeployed_shapes(&self, color: Color) -> &[PieceShape] {
        self.undeployed.get(&color).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn current_team(&self) -> Team {
        self.current_color.team()
    }

    pub fn is_valid_color(&self, color: Color) -> bool {
        self.valid_colors.contains(&color)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    #[serde(default)]
    pub scores: BTreeMap<Team, i32>,
    #[serde(default)]
    pub winner: Option<Team>,
    /// False when the game was aborted, e.g. after a rule violation.
    #[serde(default = "regular_default")]
    pub regular: bool,
}

fn regular_default() -> bool {
    true
}
