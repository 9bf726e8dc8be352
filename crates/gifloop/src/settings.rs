use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::player::PlayDirection;

/// Player defaults, persisted as JSON under the user config dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub version: u32,
    /// Delay used when the first frame carries no delay hint.
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,
    #[serde(default)]
    pub initial_direction: PlayDirection,
}

fn default_fallback_delay_ms() -> u64 {
    30
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            fallback_delay_ms: default_fallback_delay_ms(),
            initial_direction: PlayDirection::Play,
        }
    }
}

impl PlayerConfig {
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("gifloop").join("player.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded player config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse player config: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No player config found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create config dir: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::error!("Failed to write player config: {e}");
                } else {
                    log::debug!("Saved player config to {}", path.display());
                }
            }
            Err(e) => log::error!("Failed to serialize player config: {e}"),
        }
    }
}
