use derivative::Derivative;
use log::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const APP_NAME: &str = "scoreboard-sync";

#[derive(Derivative, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derivative(Debug, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL for commands
    #[derivative(Default(value = "\"http://localhost:8000\".to_string()"))]
    pub authority_url: String,
    /// Websocket endpoint the authority pushes state on
    #[derivative(Default(value = "\"ws://localhost:8000/ws\".to_string()"))]
    pub push_url: String,
    #[derivative(Default(value = "3000"))]
    pub reconnect_delay_ms: u64,
    #[derivative(Default(value = "5000"))]
    pub command_timeout_ms: u64,
}

impl AppConfig {
    /// Reads the config file, replacing it with the defaults if it can't be
    /// read.
    pub fn load_or_default() -> Self {
        match confy::load(APP_NAME, None) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to read config file, overwriting with default. Error: {e}");
                let config = Self::default();
                if let Err(e) = confy::store(APP_NAME, None, &config) {
                    error!("Failed to write default config file: {e}");
                }
                config
            }
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
