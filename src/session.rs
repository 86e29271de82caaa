//! Boundary between the game transport and the client state.
//!
//! The transport reports snapshots, move requests and the end of the game
//! through [`GameHandler`]. Moves leave through [`Transport`]. A transport
//! running on another thread talks to a [`SessionHandle`]; the UI thread
//! then applies the queued events with [`GameSession::pump`].

use std::collections::BTreeMap;
use std::sync::mpsc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::ClientSettings;
use crate::decision::{source_for, Decision, DecisionSource};
use crate::error::ClientError;
use crate::observable::Property;
use crate::piece::{Color, Coordinates, Piece, PieceShape, Rotation};
use crate::rules::RuleEngine;
use crate::selection::PieceSelection;
use crate::state::{Board, GameResult, GameState, Move, Team};
use crate::turn::{GameOutcome, GamePhase, TurnTracker};
use crate::undeployed::UndeployedPieceSet;

/// Inbound callbacks of the game transport.
pub trait GameHandler {
    fn on_game_state_update(&mut self, state: GameState);
    fn on_action_requested(&mut self, team: Team);
    fn on_game_ended(&mut self, result: Option<GameResult>, team: Option<Team>, error: Option<String>);
    /// The server paused or resumed the game.
    fn on_paused(&mut self, paused: bool);
}

/// Outbound side of the game transport.
pub trait Transport {
    /// Must not block.
    fn send_move(&mut self, team: Team, mv: Move);

    fn set_paused(&mut self, _paused: bool) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    StateUpdate(GameState),
    ActionRequested(Team),
    GameEnded {
        result: Option<GameResult>,
        team: Option<Team>,
        error: Option<String>,
    },
    Paused(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportCommand {
    Move { team: Team, mv: Move },
    Pause(bool),
}

/// Forwards everything the session sends into a channel.
pub struct ChannelTransport {
    tx: mpsc::Sender<TransportCommand>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::Receiver<TransportCommand>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: TransportCommand) {
        if self.tx.send(command).is_err() {
            warn!(?command, "transport receiver dropped");
        }
    }
}

impl Transport for ChannelTransport {
    fn send_move(&mut self, team: Team, mv: Move) {
        self.send(TransportCommand::Move { team, mv });
    }

    fn set_paused(&mut self, paused: bool) {
        self.send(TransportCommand::Pause(paused));
    }
}

/// Thread-safe entry point for transports that do not run on the UI thread.
/// Events are queued and applied in order by [`GameSession::pump`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn send(&self, event: SessionEvent) -> bool {
        if self.tx.send(event).is_err() {
            warn!("session is gone, event dropped");
            return false;
        }
        true
    }
}

impl GameHandler for SessionHandle {
    fn on_game_state_update(&mut self, state: GameState) {
        self.send(SessionEvent::StateUpdate(state));
    }

    fn on_action_requested(&mut self, team: Team) {
        self.send(SessionEvent::ActionRequested(team));
    }

    fn on_game_ended(&mut self, result: Option<GameResult>, team: Option<Team>, error: Option<String>) {
        self.send(SessionEvent::GameEnded { result, team, error });
    }

    fn on_paused(&mut self, paused: bool) {
        self.send(SessionEvent::Paused(paused));
    }
}

/// A snapshot as it was displayed, with the flags derived for it.
struct HistoryEntry {
    state: GameState,
    unplayable: [bool; 4],
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub phase: GamePhase,
    pub turn: u32,
    pub max_turn: u32,
    pub active_color: Color,
    pub human_turn: bool,
    pub can_step_back: bool,
    pub can_step_forward: bool,
    pub selection: Piece,
    pub cells: Vec<Coordinates>,
    pub board: Option<Board>,
    pub undeployed: BTreeMap<Color, Vec<PieceShape>>,
    pub legal: BTreeMap<Color, Vec<PieceShape>>,
    pub unplayable: BTreeMap<Color, bool>,
    pub diagnostics: Option<String>,
}

pub struct GameSession {
    settings: ClientSettings,
    rules: Box<dyn RuleEngine>,
    transport: Box<dyn Transport>,
    sources: [Option<Box<dyn DecisionSource>>; 2],
    selection: PieceSelection,
    turns: TurnTracker,
    undeployed: UndeployedPieceSet,
    diagnostics: Property<Option<String>>,
    current: Option<GameState>,
    history: BTreeMap<u32, HistoryEntry>,
    pending: Option<Team>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
}

impl GameSession {
    pub fn new(
        settings: ClientSettings,
        rules: impl RuleEngine + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        let sources = Team::ALL.map(|team| {
            let seed = settings.bot_seed.map(|s| s.wrapping_add(team.index() as u64));
            source_for(settings.player_type(team), seed)
        });
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            settings,
            rules: Box::new(rules),
            transport: Box::new(transport),
            sources,
            selection: PieceSelection::default(),
            turns: TurnTracker::new(),
            undeployed: UndeployedPieceSet::new(),
            diagnostics: Property::new(None),
            current: None,
            history: BTreeMap::new(),
            pending: None,
            events_tx,
            events_rx,
        }
    }

    pub fn selection(&self) -> &PieceSelection {
        &self.selection
    }

    pub fn turns(&self) -> &TurnTracker {
        &self.turns
    }

    pub fn undeployed(&self) -> &UndeployedPieceSet {
        &self.undeployed
    }

    /// Last error reported by the server, if any.
    pub fn diagnostics(&self) -> &Property<Option<String>> {
        &self.diagnostics
    }

    /// The newest snapshot received from the transport.
    pub fn current_state(&self) -> Option<&GameState> {
        self.current.as_ref()
    }

    pub fn pending_request(&self) -> Option<Team> {
        self.pending
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.events_tx.clone(),
        }
    }

    /// Applies every event queued through a [`SessionHandle`], oldest first.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    pub fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateUpdate(state) => self.on_game_state_update(state),
            SessionEvent::ActionRequested(team) => self.on_action_requested(team),
            SessionEvent::GameEnded { result, team, error } => {
                self.on_game_ended(result, team, error)
            }
            SessionEvent::Paused(paused) => self.on_paused(paused),
        }
    }

    fn is_human(&self, team: Team) -> bool {
        self.settings.is_human(team) && self.pending == Some(team)
    }

    /// Rebuilds the undeployed sets and their legal subsets from `state`.
    fn render(&mut self, state: &GameState) {
        for color in Color::ALL {
            self.undeployed.replace(color, state.undeployed_shapes(color));
            let legal = self.rules.legal_shapes(state, color);
            self.undeployed.set_legal(color, &legal);
        }
    }

    fn auto_select(&mut self, color: Color) {
        if !self.settings.auto_select {
            return;
        }
        if let Some(shape) = self.undeployed.auto_select_candidate(color, &self.selection) {
            debug!(%color, %shape, "auto-selecting piece");
            self.selection.select_shape(color, shape);
        }
    }

    pub fn on_game_state_update(&mut self, state: GameState) {
        if self.current.as_ref() == Some(&state) {
            debug!(turn = state.turn, "duplicate snapshot dropped");
            return;
        }
        if self.turns.phase().get().is_ended() {
            debug!(turn = state.turn, "game has ended, snapshot dropped");
            return;
        }
        debug!(turn = state.turn, color = %state.current_color, "game state update");
        if self.pending.is_some_and(|team| team != state.current_team()) {
            self.pending = None;
        }
        let active = state.current_color;
        let previous_turn = *self.turns.current_turn().get();
        let previous_color = *self.turns.active_color().get();
        let was_stuck = self.undeployed.legal(active).get().is_empty();
        self.render(&state);

        let human = self.is_human(state.current_team());
        self.turns.apply(&state, human);
        self.undeployed
            .on_turn_boundary(previous_turn, state.turn, previous_color, active);

        let now_stuck = self.undeployed.legal(active).get().is_empty();
        if !now_stuck && (was_stuck || previous_color != active) {
            self.auto_select(active);
        }

        let entry = HistoryEntry {
            state: state.clone(),
            unplayable: self.undeployed.unplayable_flags(),
        };
        self.history.insert(state.turn, entry);
        self.current = Some(state);
    }

    pub fn on_action_requested(&mut self, team: Team) {
        let Some(state) = self.current.as_ref() else {
            error!(%team, "move requested before any game state arrived");
            return;
        };
        let Some(source) = self.sources[team.index()].as_mut() else {
            warn!(%team, "move requested for a team played by an external client");
            return;
        };
        let active = state.current_color;
        match source.request_move(state, self.rules.as_ref()) {
            Decision::Await => {
                debug!(%team, %active, "waiting for the operator");
                self.pending = Some(team);
                self.turns.set_human_turn(true);
                self.auto_select(active);
            }
            Decision::Play(mv) => self.submit_move(mv),
        }
    }

    pub fn on_game_ended(&mut self, result: Option<GameResult>, team: Option<Team>, error: Option<String>) {
        if let Some(message) = &error {
            warn!(team = ?team, %message, "game ended with an error");
            self.diagnostics.set(Some(message.clone()));
        }
        self.pending = None;
        let outcome = GameOutcome { result, team, error };
        if let Err(e) = self.turns.end(outcome) {
            warn!(%e, "game end reported twice");
        }
    }

    /// Applies a pause or resume decided by the server. Nothing is sent back.
    pub fn on_paused(&mut self, paused: bool) {
        let result = if paused {
            self.turns.pause()
        } else {
            self.turns.resume()
        };
        if let Err(e) = result {
            debug!(%e, "server pause state not applied");
        }
    }

    /// Hands `mv` to the transport. The server validates it.
    pub fn submit_move(&mut self, mv: Move) {
        let team = mv.color().team();
        debug!(%team, %mv, "submitting move");
        self.transport.send_move(team, mv);
        self.pending = None;
        self.turns.set_human_turn(false);
    }

    /// Selects an undeployed shape. Shapes that cannot be placed right now
    /// are ignored.
    pub fn select_piece(&mut self, color: Color, shape: PieceShape) -> bool {
        if !self.undeployed.is_selectable(color, shape) {
            debug!(%color, %shape, "piece is not selectable");
            return false;
        }
        self.selection.select_shape(color, shape);
        true
    }

    pub fn rotate(&mut self, by: Rotation) {
        self.selection.rotate(by);
    }

    pub fn flip(&mut self) {
        self.selection.flip();
    }

    pub fn scroll(&mut self, delta: f64) {
        self.selection.scroll(delta);
    }

    /// Moves the selection to the cell under the pointer.
    pub fn hover(&mut self, anchor: Coordinates) {
        self.selection.set_anchor(anchor);
    }

    pub fn start(&mut self) -> Result<(), ClientError> {
        self.turns.start()
    }

    pub fn toggle_pause(&mut self) -> Result<(), ClientError> {
        self.turns.toggle_pause()?;
        let paused = matches!(self.turns.phase().get(), GamePhase::Paused);
        self.transport.set_paused(paused);
        Ok(())
    }

    /// Forgets the previous game entirely.
    pub fn new_game(&mut self) {
        debug!("starting a new game");
        self.turns.reset();
        self.undeployed.clear();
        self.history.clear();
        self.current = None;
        self.pending = None;
        self.diagnostics.set(None);
        self.selection.select(Piece::new(Color::Red, PieceShape::Mono));
    }

    /// Places the selected piece at `anchor`. Only valid on a human turn.
    pub fn confirm(&mut self, anchor: Coordinates) -> bool {
        if !*self.turns.is_human_turn().get() {
            warn!("confirm outside of a human turn ignored");
            return false;
        }
        self.selection.set_anchor(anchor);
        let piece = self.selection.piece();
        self.submit_move(Move::Set { piece });
        true
    }

    pub fn skip(&mut self) -> bool {
        if !*self.turns.is_human_turn().get() {
            warn!("skip outside of a human turn ignored");
            return false;
        }
        let color = *self.turns.active_color().get();
        self.submit_move(Move::Skip { color });
        true
    }

    /// Shows an already-seen turn. Returns false when the turn is unknown.
    pub fn show_turn(&mut self, turn: u32) -> bool {
        let Some((state, flags)) = self
            .history
            .get(&turn)
            .map(|entry| (entry.state.clone(), entry.unplayable))
        else {
            debug!(turn, "no snapshot for turn");
            return false;
        };
        if let Err(e) = self.turns.scrub_to(turn, state.current_color) {
            debug!(%e, "cannot scrub");
            return false;
        }
        self.render(&state);
        self.undeployed.restore_unplayable(flags);
        // Back on the live turn the operator can answer a pending request again.
        if self.current.as_ref().is_some_and(|live| live.turn == turn) {
            let human = self.is_human(state.current_team());
            self.turns.set_human_turn(human);
        }
        true
    }

    pub fn step_back(&mut self) -> bool {
        if !self.turns.can_step_back() {
            return false;
        }
        self.show_turn(*self.turns.current_turn().get() - 1)
    }

    pub fn step_forward(&mut self) -> bool {
        if !self.turns.can_step_forward() {
            return false;
        }
        self.show_turn(*self.turns.current_turn().get() + 1)
    }

    pub fn view(&self) -> ClientView {
        let turn = *self.turns.current_turn().get();
        let per_color = |f: &dyn Fn(Color) -> Vec<PieceShape>| {
            Color::ALL.into_iter().map(|c| (c, f(c))).collect::<BTreeMap<_, _>>()
        };
        ClientView {
            phase: self.turns.phase().get().clone(),
            turn,
            max_turn: *self.turns.max_turn_seen().get(),
            active_color: *self.turns.active_color().get(),
            human_turn: *self.turns.is_human_turn().get(),
            can_step_back: self.turns.can_step_back(),
            can_step_forward: self.turns.can_step_forward(),
            selection: self.selection.piece(),
            cells: self.selection.cells().get().iter().copied().collect(),
            board: self.history.get(&turn).map(|entry| entry.state.board.clone()),
            undeployed: per_color(&|c| self.undeployed.shapes(c).to_vec()),
            legal: per_color(&|c| self.undeployed.legal(c).get().clone()),
            unplayable: Color::ALL
                .into_iter()
                .map(|c| (c, *self.undeployed.unplayable(c).get()))
                .collect(),
            diagnostics: self.diagnostics.get().clone(),
        }
    }
}

impl GameHandler for GameSession {
    fn on_paused(&mut self, paused: bool) {
        GameSession::on_paused(self, paused);
    }

    fn on_game_state_update(&mut self, state: GameState) {
        GameSession::on_game_state_update(self, state);
    }

    fn on_action_requested(&mut self, team: Team) {
        GameSession::on_action_requested(self, team);
    }

    fn on_game_ended(&mut self, result: Option<GameResult>, team: Option<Team>, error: Option<String>) {
        GameSession::on_game_ended(self, result, team, error);
    }
}
