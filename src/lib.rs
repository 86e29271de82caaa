pub mod config;
pub mod decision;
pub mod error;
pub mod observable;
pub mod piece;
pub mod protocol;
pub mod rules;
pub mod selection;
pub mod session;
pub mod state;
pub mod turn;
pub mod undeployed;

use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use config::{ClientSettings, PlayerSettings, PlayerType};
pub use decision::{BotDecisionSource, Decision, DecisionSource, HumanDecisionSource};
pub use error::ClientError;
pub use observable::{Change, ListenerId, Property, Signal};
pub use piece::{Color, Coordinates, Piece, PieceShape, Rotation, BOARD_SIZE};
pub use protocol::BridgeMessage;
pub use rules::{BlokusRules, RuleEngine};
pub use selection::PieceSelection;
pub use session::{
    ChannelTransport, ClientView, GameHandler, GameSession, SessionEvent, SessionHandle, Transport,
    TransportCommand,
};
pub use state::{Board, GameResult, GameState, Move, Team};
pub use turn::{GameOutcome, GamePhase, TurnTracker};
pub use undeployed::{UndeployedDelta, UndeployedPieceSet};

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
}

#[cfg(target_arch = "wasm32")]
fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

#[cfg(not(target_arch = "wasm32"))]
fn log(msg: &str) {
    tracing::info!("{msg}");
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Hands outgoing bridge messages to a JS callback as JSON text.
struct JsTransport {
    on_message: js_sys::Function,
}

impl JsTransport {
    fn post(&self, message: BridgeMessage) {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                log(&format!("[client] cannot encode message: {e}"));
                return;
            }
        };
        if let Err(e) = self.on_message.call1(&JsValue::NULL, &JsValue::from_str(&text)) {
            log(&format!("[client] message callback failed: {e:?}"));
        }
    }
}

impl Transport for JsTransport {
    fn send_move(&mut self, team: Team, mv: Move) {
        self.post(BridgeMessage::Move { team, mv });
    }

    fn set_paused(&mut self, paused: bool) {
        self.post(BridgeMessage::Pause { paused });
    }
}

fn notify(callback: &js_sys::Function, name: &str) {
    if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(name)) {
        log(&format!("[client] watch callback failed for {name}: {e:?}"));
    }
}

#[wasm_bindgen]
pub struct GameClient {
    session: GameSession,
}

#[wasm_bindgen]
impl GameClient {
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue, on_message: js_sys::Function) -> Result<GameClient, JsValue> {
        let settings: ClientSettings = from_value(settings).unwrap_or_default();
        settings.validate().map_err(js_err)?;
        log(&format!(
            "[client] {} ({:?}) vs {} ({:?})",
            settings.players[0].name,
            settings.players[0].player_type,
            settings.players[1].name,
            settings.players[1].player_type
        ));
        let session = GameSession::new(settings, BlokusRules, JsTransport { on_message });
        Ok(Self { session })
    }

    /// Feeds one JSON bridge message from the transport.
    #[wasm_bindgen(js_name = receive)]
    pub fn receive(&mut self, json: &str) -> Result<(), JsValue> {
        match BridgeMessage::decode(json).map_err(js_err)? {
            BridgeMessage::State { state } => self.session.on_game_state_update(state),
            BridgeMessage::RequestAction { team } => self.session.on_action_requested(team),
            BridgeMessage::GameEnded { result, team, error } => {
                self.session.on_game_ended(result, team, error)
            }
            BridgeMessage::Pause { paused } => self.session.on_paused(paused),
            other @ BridgeMessage::Move { .. } => {
                log(&format!("[client] outbound message ignored: {other:?}"))
            }
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = selectPiece)]
    pub fn select_piece(&mut self, color: &str, shape: &str) -> Result<bool, JsValue> {
        let color: Color = color.parse().map_err(js_err)?;
        let shape: PieceShape = shape.parse().map_err(js_err)?;
        Ok(self.session.select_piece(color, shape))
    }

    #[wasm_bindgen(js_name = rotate)]
    pub fn rotate(&mut self, by: &str) -> Result<(), JsValue> {
        let by: Rotation = by.parse().map_err(js_err)?;
        self.session.rotate(by);
        Ok(())
    }

    #[wasm_bindgen(js_name = flip)]
    pub fn flip(&mut self) {
        self.session.flip();
    }

    #[wasm_bindgen(js_name = scroll)]
    pub fn scroll(&mut self, delta: f64) {
        self.session.scroll(delta);
    }

    #[wasm_bindgen(js_name = hover)]
    pub fn hover(&mut self, x: i32, y: i32) {
        self.session.hover(Coordinates::new(x, y));
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&mut self) -> Result<(), JsValue> {
        self.session.toggle_pause().map_err(js_err)
    }

    #[wasm_bindgen(js_name = start)]
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.session.start().map_err(js_err)
    }

    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self) {
        self.session.new_game();
    }

    #[wasm_bindgen(js_name = confirm)]
    pub fn confirm(&mut self, x: i32, y: i32) -> bool {
        self.session.confirm(Coordinates::new(x, y))
    }

    #[wasm_bindgen(js_name = skip)]
    pub fn skip(&mut self) -> bool {
        self.session.skip()
    }

    #[wasm_bindgen(js_name = stepBack)]
    pub fn step_back(&mut self) -> bool {
        self.session.step_back()
    }

    #[wasm_bindgen(js_name = stepForward)]
    pub fn step_forward(&mut self) -> bool {
        self.session.step_forward()
    }

    #[wasm_bindgen(js_name = showTurn)]
    pub fn show_turn(&mut self, turn: u32) -> bool {
        self.session.show_turn(turn)
    }

    #[wasm_bindgen(js_name = view)]
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.view()).map_err(|e| e.into())
    }

    /// Calls `callback` with the name of every watched value that changes.
    #[wasm_bindgen(js_name = watch)]
    pub fn watch(&self, callback: js_sys::Function) {
        let turns = self.session.turns();
        let cb = callback.clone();
        turns.phase().subscribe(move |_| notify(&cb, "phase"));
        let cb = callback.clone();
        turns.current_turn().subscribe(move |_| notify(&cb, "turn"));
        let cb = callback.clone();
        turns.max_turn_seen().subscribe(move |_| notify(&cb, "maxTurn"));
        let cb = callback.clone();
        turns.active_color().subscribe(move |_| notify(&cb, "activeColor"));
        let cb = callback.clone();
        turns.is_human_turn().subscribe(move |_| notify(&cb, "humanTurn"));
        let cb = callback.clone();
        self.session.selection().cells().subscribe(move |_| notify(&cb, "selection"));
        let cb = callback.clone();
        self.session.diagnostics().subscribe(move |_| notify(&cb, "diagnostics"));

        let undeployed = self.session.undeployed();
        let cb = callback.clone();
        undeployed.subscribe_deltas(move |_| notify(&cb, "undeployed"));
        for color in Color::ALL {
            let cb = callback.clone();
            undeployed.legal(color).subscribe(move |_| notify(&cb, "legal"));
            let cb = callback.clone();
            undeployed.unplayable(color).subscribe(move |_| notify(&cb, "unplayable"));
        }
    }
}
