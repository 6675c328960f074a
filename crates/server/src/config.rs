use std::path::Path;

use serde::{Deserialize, Serialize};
use volley::net::MESSAGE_CAPACITY;
use volley::{ClientBound, DEFAULT_PORT, DEFAULT_TICK_RATE, MovementConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("max_clients {max_clients} exceeds the {limit} states one snapshot can carry")]
    TooManyClients { max_clients: usize, limit: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub tick_rate: u32,
    pub snapshot_rate: u32,
    /// Bounded by how many client states fit in one snapshot message.
    pub max_clients: usize,
    pub spawn_spacing: f32,
    pub movement: MovementConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tick_rate: DEFAULT_TICK_RATE,
            snapshot_rate: 60,
            max_clients: 32,
            spawn_spacing: 2.0,
            movement: MovementConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate(MESSAGE_CAPACITY)?;
        Ok(config)
    }

    /// Rejects settings whose snapshots would not fit in a message of `message_bytes`.
    pub fn validate(&self, message_bytes: usize) -> Result<(), ConfigError> {
        let limit = ClientBound::max_states(message_bytes);
        if self.max_clients > limit {
            return Err(ConfigError::TooManyClients {
                max_clients: self.max_clients,
                limit,
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Seconds between snapshot broadcasts; zero means every tick.
    pub fn snapshot_interval(&self) -> f32 {
        if self.snapshot_rate == 0 {
            return 0.0;
        }
        1.0 / self.snapshot_rate as f32
    }
}
