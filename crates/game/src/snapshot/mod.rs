mod buffer;
mod entity;
mod interpolation;
mod world;

pub use buffer::{
    MAX_BUFFERED_SNAPSHOTS, MIN_BUFFERED_SNAPSHOTS, SnapshotSender, SnapshotStore, channel,
};
pub use entity::{ClientId, ClientState, STARTING_HEALTH, Transform};
pub use interpolation::{
    DEFAULT_SNAPSHOT_RATE, InterpolationConfig, Interpolator, RemoteEntity, interpolation_ratio,
};
pub use world::Snapshot;
pub(crate) use world::{decode_states, encode_states};
