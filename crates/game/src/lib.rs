pub mod codec;
pub mod combat;
pub mod net;
pub mod simulation;
pub mod snapshot;

pub use codec::{BitBuffer, CodecError};
pub use combat::{HIT_DAMAGE, HitTest, RayHitTest, SCORE_PER_HIT, ShotLedger, ShotWatermark};
pub use net::{
    ClientBound, DEFAULT_PORT, DEFAULT_TICK_RATE, EventKind, HitReport, InputBatch, JoinAccepted,
    LinkConditions, MemoryNetwork, MemoryTransport, MessageBuffer, MessagePool, NetworkStats,
    PooledMessage, ProtocolError, ReportedShot, Role, ServerBound, Transport, TransportError,
    UdpTransport,
};
pub use simulation::{
    Buttons, ClientInputLedger, FixedTimestep, KinematicMover, Locomotion, LocomotionCommand,
    MovementConfig, SequenceId, ServerInputLedger,
};
pub use snapshot::{
    ClientId, ClientState, InterpolationConfig, Interpolator, RemoteEntity, STARTING_HEALTH,
    Snapshot, SnapshotSender, SnapshotStore, Transform,
};
