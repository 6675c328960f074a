mod memory;
mod pool;
mod protocol;
mod stats;
mod transport;
pub(crate) mod wire;

pub use memory::{MemoryNetwork, MemoryTransport};
pub use pool::{DEFAULT_MAX_IDLE, MESSAGE_CAPACITY, MessageBuffer, MessagePool, PooledMessage};
pub use protocol::{
    ClientBound, DEFAULT_PORT, DEFAULT_TICK_RATE, EventKind, HitReport, InputBatch, JoinAccepted,
    ProtocolError, ReportedShot, Role, ServerBound, accepts,
};
pub use stats::{LinkConditions, NetworkStats};
pub use transport::{Transport, TransportError, UdpTransport};
