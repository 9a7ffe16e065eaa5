//! Session configuration.

use std::fs::File;
use std::io::{Error, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::GameKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkConfig {
    pub game: GameKind,
    /// Compatibility hack: actors join the party when talked to.
    pub party_all_the_time: bool,
}

impl Default for TalkConfig {
    fn default() -> Self {
        Self {
            game: GameKind::Ultima6,
            party_all_the_time: false,
        }
    }
}

pub struct TalkConfigBuilder {
    config: TalkConfig,
}

impl TalkConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TalkConfig::default(),
        }
    }

    pub fn with_game(mut self, game: GameKind) -> Self {
        self.config.game = game;
        self
    }

    pub fn with_party_all_the_time(mut self, enabled: bool) -> Self {
        self.config.party_all_the_time = enabled;
        self
    }

    pub fn get(self) -> TalkConfig {
        self.config
    }
}

impl Default for TalkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TalkConfigReader;

impl TalkConfigReader {
    pub fn read_config(path: impl AsRef<Path>) -> Result<TalkConfig, Error> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let config = serde_json::from_slice(bytes.as_slice())?;
        Ok(config)
    }
}
