use std::net::SocketAddr;

use volley::ClientId;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientJoined { client_id: ClientId, addr: SocketAddr },
    JoinRejected { addr: SocketAddr, reason: String },
    ClientEliminated { client_id: ClientId, by: ClientId },
    MessageDropped { addr: SocketAddr, reason: String },
    Error { message: String },
}
