use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use log::{debug, warn};

use super::pool::{MessageBuffer, MessagePool, PooledMessage};
use super::stats::NetworkStats;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("message of {size} bytes exceeds the {limit} byte datagram limit")]
    Oversized { size: usize, limit: usize },
    #[error("transport is closed")]
    Closed,
}

/// Unreliable, unordered datagram channel; `receive` never blocks.
pub trait Transport {
    fn send(&mut self, message: &MessageBuffer, to: SocketAddr) -> Result<(), TransportError>;

    fn receive(&mut self) -> Result<Option<PooledMessage>, TransportError>;

    fn close(&mut self);

    fn local_addr(&self) -> SocketAddr;

    fn stats(&self) -> &NetworkStats;
}

pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    pool: MessagePool,
    stats: NetworkStats,
    recv_buffer: Vec<u8>,
    closed: bool,
}

impl UdpTransport {
    pub fn bind<A: ToSocketAddrs>(addr: A, pool: MessagePool) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;
        let recv_buffer = vec![0u8; pool.message_capacity()];

        Ok(Self {
            socket,
            local_addr,
            pool,
            stats: NetworkStats::default(),
            recv_buffer,
            closed: false,
        })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, message: &MessageBuffer, to: SocketAddr) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let data = message.payload();
        if data.len() > self.recv_buffer.len() {
            return Err(TransportError::Oversized {
                size: data.len(),
                limit: self.recv_buffer.len(),
            });
        }

        let bytes = self.socket.send_to(data, to)?;
        self.stats.record_sent(bytes);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<PooledMessage>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((0, _)) => continue,
                Ok((size, addr)) => {
                    let mut message = self.pool.obtain();
                    if let Err(e) = message.fill_from(&self.recv_buffer[..size], addr) {
                        warn!("Dropping datagram from {}: {}", addr, e);
                        self.stats.record_dropped();
                        continue;
                    }
                    self.stats.record_received(size);
                    return Ok(Some(message));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => {
                    debug!("Ignoring connection reset on {}", self.local_addr);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}
