use serde::Serialize;
use tracing::debug;

use crate::error::ClientError;
use crate::observable::Property;
use crate::piece::Color;
use crate::state::{GameResult, GameState, Team};

/// How a game ended, as reported by the transport.
#[derive(Clone, Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameOutcome {
    pub result: Option<GameResult>,
    pub team: Option<Team>,
    pub error: Option<String>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Paused,
    Ended(GameOutcome),
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::NotStarted => "not started",
            GamePhase::InProgress => "in progress",
            GamePhase::Paused => "paused",
            GamePhase::Ended(_) => "ended",
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, GamePhase::Ended(_))
    }
}

/// Turn flow of the running game.
pub struct TurnTracker {
    phase: Property<GamePhase>,
    current_turn: Property<u32>,
    max_turn_seen: Property<u32>,
    active_color: Property<Color>,
    previous_color: Property<Color>,
    is_human_turn: Property<bool>,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self {
            phase: Property::new(GamePhase::NotStarted),
            current_turn: Property::new(0),
            max_turn_seen: Property::new(0),
            active_color: Property::new(Color::Red),
            previous_color: Property::new(Color::Red),
            is_human_turn: Property::new(false),
        }
    }

    pub fn phase(&self) -> &Property<GamePhase> {
        &self.phase
    }

    pub fn current_turn(&self) -> &Property<u32> {
        &self.current_turn
    }

    /// High-water mark of all turns received from the transport.
    pub fn max_turn_seen(&self) -> &Property<u32> {
        &self.max_turn_seen
    }

    pub fn active_color(&self) -> &Property<Color> {
        &self.active_color
    }

    pub fn previous_color(&self) -> &Property<Color> {
        &self.previous_color
    }

    pub fn is_human_turn(&self) -> &Property<bool> {
        &self.is_human_turn
    }

    fn invalid(&self, event: &'static str) -> ClientError {
        ClientError::InvalidTransition {
            from: self.phase.get().name(),
            event,
        }
    }

    pub fn start(&mut self) -> Result<(), ClientError> {
        match self.phase.get() {
            GamePhase::NotStarted => {
                self.phase.set(GamePhase::InProgress);
                Ok(())
            }
            _ => Err(self.invalid("start")),
        }
    }

    pub fn pause(&mut self) -> Result<(), ClientError> {
        match self.phase.get() {
            GamePhase::InProgress => {
                self.phase.set(GamePhase::Paused);
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    pub fn resume(&mut self) -> Result<(), ClientError> {
        match self.phase.get() {
            GamePhase::Paused => {
                self.phase.set(GamePhase::InProgress);
                Ok(())
            }
            _ => Err(self.invalid("resume")),
        }
    }

    pub fn toggle_pause(&mut self) -> Result<(), ClientError> {
        match self.phase.get() {
            GamePhase::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    pub fn end(&mut self, outcome: GameOutcome) -> Result<(), ClientError> {
        if self.phase.get().is_ended() {
            return Err(self.invalid("end"));
        }
        self.phase.set(GamePhase::Ended(outcome));
        self.is_human_turn.set(false);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.phase.set(GamePhase::NotStarted);
        self.current_turn.set(0);
        self.max_turn_seen.set(0);
        self.active_color.set(Color::Red);
        self.previous_color.set(Color::Red);
        self.is_human_turn.set(false);
    }

    /// Takes over turn number and active colour from a snapshot. Ignored
    /// once the game has ended; starts a game that has not started yet.
    pub fn apply(&mut self, state: &GameState, active_is_human: bool) -> bool {
        match self.phase.get() {
            GamePhase::Ended(_) => {
                debug!(turn = state.turn, "game has ended, snapshot not applied");
                return false;
            }
            GamePhase::NotStarted => {
                self.phase.set(GamePhase::InProgress);
            }
            GamePhase::InProgress | GamePhase::Paused => {}
        }
        let previous = *self.active_color.get();
        let max = (*self.max_turn_seen.get()).max(state.turn);
        self.max_turn_seen.set(max);
        self.current_turn.set(state.turn);
        self.previous_color.set(previous);
        self.active_color.set(state.current_color);
        self.is_human_turn.set(active_is_human);
        true
    }

    /// Moves the displayed turn to one already seen. A running game is
    /// paused while the operator looks at history.
    pub fn scrub_to(&mut self, turn: u32, color: Color) -> Result<(), ClientError> {
        if matches!(self.phase.get(), GamePhase::NotStarted) {
            return Err(self.invalid("scrub"));
        }
        if turn > *self.max_turn_seen.get() {
            return Err(ClientError::UnknownTurn(turn));
        }
        if matches!(self.phase.get(), GamePhase::InProgress) {
            self.phase.set(GamePhase::Paused);
        }
        let previous = *self.active_color.get();
        self.current_turn.set(turn);
        self.previous_color.set(previous);
        self.active_color.set(color);
        self.is_human_turn.set(false);
        Ok(())
    }

    pub fn set_human_turn(&mut self, human: bool) {
        self.is_human_turn.set(human);
    }

    pub fn can_step_back(&self) -> bool {
        *self.current_turn.get() > 0
    }

    pub fn can_step_forward(&self) -> bool {
        self.current_turn.get() < self.max_turn_seen.get()
    }
}

impl Default for TurnTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceShape;

    fn snapshot(turn: u32, color: Color) -> GameState {
        let mut state = GameState::new(PieceShape::PentoL);
        state.turn = turn;
        state.current_color = color;
        state
    }

    #[test]
    fn max_turn_survives_regression() {
        let mut turns = TurnTracker::new();
        for t in 0..=10 {
            turns.apply(&snapshot(t, Color::ALL[(t % 4) as usize]), false);
        }
        turns.apply(&snapshot(2, Color::Green), false);
        assert_eq!(*turns.current_turn().get(), 2);
        assert_eq!(*turns.max_turn_seen().get(), 10);
        assert!(turns.can_step_forward());
        assert!(turns.can_step_back());
    }

    #[test]
    fn scrub_keeps_high_water_mark_and_pauses() {
        let mut turns = TurnTracker::new();
        turns.apply(&snapshot(10, Color::Blue), true);
        turns.scrub_to(2, Color::Green).unwrap();
        assert_eq!(*turns.current_turn().get(), 2);
        assert_eq!(*turns.max_turn_seen().get(), 10);
        assert_eq!(*turns.phase().get(), GamePhase::Paused);
        assert!(!*turns.is_human_turn().get());
        assert!(matches!(
            turns.scrub_to(11, Color::Red),
            Err(ClientError::UnknownTurn(11))
        ));
    }

    #[test]
    fn first_snapshot_starts_the_game() {
        let mut turns = TurnTracker::new();
        assert!(turns.apply(&snapshot(0, Color::Red), true));
        assert_eq!(*turns.phase().get(), GamePhase::InProgress);
        assert!(*turns.is_human_turn().get());
    }

    #[test]
    fn pause_and_resume() {
        let mut turns = TurnTracker::new();
        assert!(turns.pause().is_err());
        turns.start().unwrap();
        turns.toggle_pause().unwrap();
        assert_eq!(*turns.phase().get(), GamePhase::Paused);
        turns.toggle_pause().unwrap();
        assert_eq!(*turns.phase().get(), GamePhase::InProgress);
        assert!(turns.resume().is_err());
        assert!(turns.start().is_err());
    }

    #[test]
    fn ended_game_ignores_snapshots() {
        let mut turns = TurnTracker::new();
        turns.apply(&snapshot(4, Color::Red), false);
        turns.end(GameOutcome::default()).unwrap();
        assert!(!turns.apply(&snapshot(5, Color::Blue), false));
        assert_eq!(*turns.current_turn().get(), 4);
        let err = turns.end(GameOutcome::default()).unwrap_err();
        assert_eq!(err.to_string(), "cannot end while ended");
        assert!(turns.toggle_pause().is_err());
    }

    #[test]
    fn reset_returns_to_turn_zero() {
        let mut turns = TurnTracker::new();
        turns.apply(&snapshot(7, Color::Yellow), true);
        turns.end(GameOutcome::default()).unwrap();
        turns.reset();
        assert_eq!(*turns.phase().get(), GamePhase::NotStarted);
        assert_eq!(*turns.current_turn().get(), 0);
        assert_eq!(*turns.max_turn_seen().get(), 0);
        assert_eq!(*turns.active_color().get(), Color::Red);
        assert!(turns.scrub_to(0, Color::Red).is_err());
    }

    #[test]
    fn previous_color_tracks_handoff() {
        let mut turns = TurnTracker::new();
        turns.apply(&snapshot(0, Color::Red), false);
        turns.apply(&snapshot(1, Color::Blue), false);
        assert_eq!(*turns.previous_color().get(), Color::Red);
        assert_eq!(*turns.active_color().get(), Color::Blue);
    }
}
