//! JSON messages between the browser client and a native bot process.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::state::{GameResult, GameState, Move, Team};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    State {
        state: GameState,
    },
    RequestAction {
        team: Team,
    },
    GameEnded {
        #[serde(default)]
        result: Option<GameResult>,
        #[serde(default)]
        team: Option<Team>,
        #[serde(default)]
        error: Option<String>,
    },
    Move {
        team: Team,
        mv: Move,
    },
    Pause {
        paused: bool,
    },
}

impl BridgeMessage {
    pub fn encode(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ClientError> {
        Ok(serde_json::from_str(text)?)
    }
}
