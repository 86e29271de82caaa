//! Rule evaluation the client consumes. The server stays authoritative;
//! the client only uses this to gate the UI and to drive the bot.

use std::collections::BTreeSet;

use crate::piece::{Color, Coordinates, Piece, PieceShape, BOARD_SIZE};
use crate::state::{Board, GameState, Move};

pub trait RuleEngine {
    /// Every legal set move for the colour whose turn it is.
    fn possible_moves(&self, state: &GameState) -> Vec<Move>;

    fn is_legal(&self, state: &GameState, piece: &Piece) -> bool;

    /// Undeployed shapes of `color`, in order, that fit somewhere right now.
    fn legal_shapes(&self, state: &GameState, color: Color) -> Vec<PieceShape> {
        placeable_shapes(state, color, |piece| self.is_legal(state, piece))
    }
}

/// Every orientation and top-left position of `kind` that stays on the board.
fn placements(color: Color, kind: PieceShape) -> impl Iterator<Item = Piece> {
    kind.variants().into_iter().flat_map(move |(rotation, flipped)| {
        let cells = kind.transform(rotation, flipped);
        let width = cells.iter().map(|c| c.x).max().unwrap_or(0) + 1;
        let height = cells.iter().map(|c| c.y).max().unwrap_or(0) + 1;
        (0..=BOARD_SIZE - height).flat_map(move |y| {
            (0..=BOARD_SIZE - width).map(move |x| Piece {
                color,
                kind,
                rotation,
                is_flipped: flipped,
                position: Coordinates::new(x, y),
            })
        })
    })
}

fn placeable_shapes(
    state: &GameState,
    color: Color,
    mut legal: impl FnMut(&Piece) -> bool,
) -> Vec<PieceShape> {
    state
        .undeployed_shapes(color)
        .iter()
        .copied()
        .filter(|&kind| placements(color, kind).any(|piece| legal(&piece)))
        .collect()
}

/// Placement rules of the four-colour game:
///
/// - every cell on the board and free,
/// - no edge contact with a cell of the same colour,
/// - a colour's first piece is the start piece and covers a corner,
/// - every later piece touches its own colour at a corner.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlokusRules;

impl BlokusRules {
    fn check(state: &GameState, piece: &Piece, first_move: bool) -> bool {
        if !state.is_valid_color(piece.color)
            || !state.undeployed_shapes(piece.color).contains(&piece.kind)
        {
            return false;
        }
        let cells = piece.coordinates();
        if !Self::fits(&state.board, &cells, piece.color) {
            return false;
        }
        if first_move {
            piece.kind == state.start_piece && cells.iter().any(|c| Board::CORNERS.contains(c))
        } else {
            cells.iter().any(|c| {
                c.diagonals()
                    .iter()
                    .any(|d| state.board.get(*d) == Some(piece.color))
            })
        }
    }

    fn fits(board: &Board, cells: &BTreeSet<Coordinates>, color: Color) -> bool {
        cells.iter().all(|c| {
            Board::in_bounds(*c)
                && board.get(*c).is_none()
                && !c.neighbours().iter().any(|n| board.get(*n) == Some(color))
        })
    }

    fn is_first_move(state: &GameState, color: Color) -> bool {
        state.board.count(color) == 0
    }

    fn moves_for(state: &GameState, color: Color, kinds: &[PieceShape]) -> Vec<Move> {
        let first_move = Self::is_first_move(state, color);
        let mut moves = Vec::new();
        for &kind in kinds {
            if first_move && kind != state.start_piece {
                continue;
            }
            moves.extend(
                placements(color, kind)
                    .filter(|piece| Self::check(state, piece, first_move))
                    .map(|piece| Move::Set { piece }),
            );
        }
        moves
    }
}

impl RuleEngine for BlokusRules {
    fn possible_moves(&self, state: &GameState) -> Vec<Move> {
        let color = state.current_color;
        Self::moves_for(state, color, state.undeployed_shapes(color))
    }

    fn is_legal(&self, state: &GameState, piece: &Piece) -> bool {
        Self::check(state, piece, Self::is_first_move(state, piece.color))
    }

    // Counts the colour's cells once instead of once per placement.
    fn legal_shapes(&self, state: &GameState, color: Color) -> Vec<PieceShape> {
        let first_move = Self::is_first_move(state, color);
        placeable_shapes(state, color, |piece| Self::check(state, piece, first_move))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening() -> GameState {
        GameState::new(PieceShape::TetroL)
    }

    #[test]
    fn opening_allows_only_start_piece_in_a_corner() {
        let state = opening();
        let rules = BlokusRules;
        assert_eq!(rules.legal_shapes(&state, Color::Red), vec![PieceShape::TetroL]);

        let corner = Piece::new(Color::Red, PieceShape::TetroL);
        assert!(rules.is_legal(&state, &corner));
        let middle = corner.at(Coordinates::new(8, 8));
        assert!(!rules.is_legal(&state, &middle));
        let wrong_shape = Piece::new(Color::Red, PieceShape::Mono);
        assert!(!rules.is_legal(&state, &wrong_shape));

        let moves = rules.possible_moves(&state);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| match m {
            Move::Set { piece } => piece.kind == PieceShape::TetroL
                && piece.coordinates().iter().any(|c| Board::CORNERS.contains(c)),
            Move::Skip { .. } => false,
        }));
    }

    #[test]
    fn later_pieces_need_corner_contact_without_edge_contact() {
        let mut state = opening();
        state.board.place(&Piece::new(Color::Red, PieceShape::Mono));
        state.undeployed.get_mut(&Color::Red).unwrap().retain(|s| *s != PieceShape::Mono);
        let rules = BlokusRules;

        let diagonal = Piece::new(Color::Red, PieceShape::Domino).at(Coordinates::new(1, 1));
        assert!(rules.is_legal(&state, &diagonal));

        let edge = Piece::new(Color::Red, PieceShape::Domino).at(Coordinates::new(1, 0));
        assert!(!rules.is_legal(&state, &edge));

        let detached = Piece::new(Color::Red, PieceShape::Domino).at(Coordinates::new(5, 5));
        assert!(!rules.is_legal(&state, &detached));

        let overlap = Piece::new(Color::Blue, PieceShape::Mono);
        assert!(!rules.is_legal(&state, &overlap));
    }

    #[test]
    fn other_colours_may_touch_edges() {
        let mut state = opening();
        state.board.place(&Piece::new(Color::Red, PieceShape::Mono));
        state.board.place(&Piece::new(Color::Blue, PieceShape::Mono).at(Coordinates::new(2, 2)));
        // Touches red along an edge, blue at a corner.
        let piece = Piece::new(Color::Blue, PieceShape::Domino).at(Coordinates::new(0, 1));
        assert!(BlokusRules.is_legal(&state, &piece));
    }

    /// Uses the provided `legal_shapes`.
    struct PlainRules;

    impl RuleEngine for PlainRules {
        fn possible_moves(&self, state: &GameState) -> Vec<Move> {
            BlokusRules.possible_moves(state)
        }

        fn is_legal(&self, state: &GameState, piece: &Piece) -> bool {
            BlokusRules.is_legal(state, piece)
        }
    }

    #[test]
    fn provided_legal_shapes_matches_the_fast_path() {
        let mut state = opening();
        state.board.place(&Piece::new(Color::Red, PieceShape::TetroL));
        state.undeployed.get_mut(&Color::Red).unwrap().retain(|s| *s != PieceShape::TetroL);
        for color in [Color::Red, Color::Blue] {
            assert_eq!(
                PlainRules.legal_shapes(&state, color),
                BlokusRules.legal_shapes(&state, color)
            );
        }
        assert_eq!(BlokusRules.legal_shapes(&state, Color::Blue), vec![PieceShape::TetroL]);
    }

    #[test]
    fn retired_and_exhausted_colours_have_no_moves() {
        let mut state = opening();
        state.valid_colors.retain(|c| *c != Color::Green);
        assert!(BlokusRules.legal_shapes(&state, Color::Green).is_empty());

        state.undeployed.insert(Color::Yellow, Vec::new());
        assert!(BlokusRules.legal_shapes(&state, Color::Yellow).is_empty());
    }
}
