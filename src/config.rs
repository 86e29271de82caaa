use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::state::Team;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub enum PlayerType {
    #[default]
    Human,
    /// A bot executable started by the operator.
    Computer,
    /// A client connected by hand from elsewhere.
    Manual,
    /// The built-in bot.
    Internal,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSettings {
    pub name: String,
    pub player_type: PlayerType,
    pub executable: Option<String>,
}

impl PlayerSettings {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            player_type: PlayerType::Human,
            executable: None,
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::InvalidSettings("player name is empty".into()));
        }
        if self.player_type == PlayerType::Computer
            && self.executable.as_deref().map_or(true, |e| e.trim().is_empty())
        {
            return Err(ClientError::InvalidSettings(format!(
                "computer player {} has no executable",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self::named("Player")
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub players: [PlayerSettings; 2],
    /// Select a legal piece automatically when a colour's turn starts.
    pub auto_select: bool,
    pub bot_seed: Option<u64>,
}

impl ClientSettings {
    pub fn player(&self, team: Team) -> &PlayerSettings {
        &self.players[team.index()]
    }

    pub fn player_type(&self, team: Team) -> PlayerType {
        self.player(team).player_type
    }

    pub fn is_human(&self, team: Team) -> bool {
        self.player_type(team) == PlayerType::Human
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        self.players.iter().try_for_each(PlayerSettings::validate)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            players: [PlayerSettings::named("Player 1"), PlayerSettings::named("Player 2")],
            auto_select: true,
            bot_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: ClientSettings = serde_json::from_str(
            r#"{"players":[{"name":"Ada"},{"name":"Bot","playerType":"Internal"}]}"#,
        )
        .unwrap();
        assert!(settings.auto_select);
        assert_eq!(settings.bot_seed, None);
        assert!(settings.is_human(Team::One));
        assert_eq!(settings.player_type(Team::Two), PlayerType::Internal);
        assert!(settings.validate().is_ok());

        let empty: ClientSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ClientSettings::default());
    }

    #[test]
    fn computer_needs_an_executable() {
        let mut settings = ClientSettings::default();
        settings.players[1].player_type = PlayerType::Computer;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("no executable"));

        settings.players[1].executable = Some("./bot".into());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut settings = ClientSettings::default();
        settings.players[0].name = "  ".into();
        assert!(matches!(
            settings.validate(),
            Err(ClientError::InvalidSettings(_))
        ));
    }
}
