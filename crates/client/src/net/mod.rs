mod client;
mod config;
mod input;
mod interpolation;
mod prediction;

pub use client::{ClientError, ConnectionState, NetworkClient};
pub use config::{ClientConfig, ConfigError};
pub use input::{InputScript, InputState, ScriptError};
pub use interpolation::RemoteEntities;
pub use prediction::ClientPrediction;
