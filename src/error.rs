use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown color: {0}")]
    UnknownColor(String),
    #[error("unknown piece shape: {0}")]
    UnknownShape(String),
    #[error("unknown rotation: {0}")]
    UnknownRotation(String),
    #[error("unknown team: {0}")]
    UnknownTeam(String),
    #[error("turn {0} has not been seen yet")]
    UnknownTurn(u32),
    #[error("cannot {event} while {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}
