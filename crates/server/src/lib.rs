mod client_table;
mod config;
mod events;
mod server;

pub use client_table::{ClientRecord, ClientTable};
pub use config::{ConfigError, ServerConfig};
pub use events::ServerEvent;
pub use server::GameServer;
