use std::path::Path;

use serde::{Deserialize, Serialize};
use volley::{DEFAULT_PORT, DEFAULT_TICK_RATE, InterpolationConfig, MovementConfig, RayHitTest};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: String,
    pub bind: String,
    pub tick_rate: u32,
    pub hit_report_interval: f32,
    pub shot_ttl: f32,
    pub interpolation: InterpolationConfig,
    pub movement: MovementConfig,
    pub hit_test: RayHitTest,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: format!("127.0.0.1:{}", DEFAULT_PORT),
            bind: "0.0.0.0:0".to_string(),
            tick_rate: DEFAULT_TICK_RATE,
            hit_report_interval: 0.1,
            shot_ttl: volley::combat::SHOT_TTL_SECONDS,
            interpolation: InterpolationConfig::default(),
            movement: MovementConfig::default(),
            hit_test: RayHitTest::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_sections_override_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            server = "10.1.1.1:9000"

            [interpolation]
            snapshot_rate = 20

            [hit_test]
            radius = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.server, "10.1.1.1:9000");
        assert_eq!(config.interpolation.snapshot_rate, 20);
        assert_eq!(config.interpolation.min_buffered_snapshots, 3);
        assert_eq!(config.hit_test.radius, 1.5);
        assert_eq!(config.hit_test.range, 100.0);
        assert_eq!(config.tick_rate, DEFAULT_TICK_RATE);
    }
}
