pub mod net;

pub use net::{
    ClientConfig, ClientError, ClientPrediction, ConfigError, ConnectionState, InputScript,
    InputState, NetworkClient, RemoteEntities, ScriptError,
};
