use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::config::PlayerType;
use crate::rules::RuleEngine;
use crate::state::{GameState, Move};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The move will arrive later through the operator intents.
    Await,
    Play(Move),
}

/// Where the move for a team comes from once the transport asks for one.
pub trait DecisionSource {
    fn request_move(&mut self, state: &GameState, rules: &dyn RuleEngine) -> Decision;
}

/// The operator answers through the UI.
#[derive(Clone, Copy, Debug, Default)]
pub struct HumanDecisionSource;

impl DecisionSource for HumanDecisionSource {
    fn request_move(&mut self, _state: &GameState, _rules: &dyn RuleEngine) -> Decision {
        Decision::Await
    }
}

/// Plays a uniformly random legal move, or skips when there is none.
pub struct BotDecisionSource {
    rng: StdRng,
}

impl BotDecisionSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for BotDecisionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionSource for BotDecisionSource {
    fn request_move(&mut self, state: &GameState, rules: &dyn RuleEngine) -> Decision {
        let moves = rules.possible_moves(state);
        let mv = moves.choose(&mut self.rng).copied().unwrap_or(Move::Skip {
            color: state.current_color,
        });
        debug!(turn = state.turn, options = moves.len(), %mv, "bot picked a move");
        Decision::Play(mv)
    }
}

/// The local source for a player type. Computer and manual players are
/// separate processes, so nothing local answers for them.
pub fn source_for(player_type: PlayerType, seed: Option<u64>) -> Option<Box<dyn DecisionSource>> {
    match player_type {
        PlayerType::Human => Some(Box::new(HumanDecisionSource)),
        PlayerType::Internal => Some(Box::new(match seed {
            Some(seed) => BotDecisionSource::seeded(seed),
            None => BotDecisionSource::new(),
        })),
        PlayerType::Computer | PlayerType::Manual => None,
    }
}
