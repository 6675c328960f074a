use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use super::pool::{MessageBuffer, MessagePool, PooledMessage};
use super::stats::{LinkConditions, NetworkStats};
use super::transport::{Transport, TransportError};

type Datagram = (Vec<u8>, SocketAddr);

#[derive(Debug, Default)]
struct Links {
    queues: HashMap<SocketAddr, VecDeque<Datagram>>,
    conditions: HashMap<SocketAddr, LinkConditions>,
}

/// In-process datagram network. Every bound address gets an inbox; sends to
/// unbound addresses vanish like unanswered UDP.
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    links: Arc<Mutex<Links>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, addr: SocketAddr, pool: MessagePool) -> MemoryTransport {
        self.links().queues.entry(addr).or_default();
        MemoryTransport {
            addr,
            network: self.clone(),
            pool,
            stats: NetworkStats::default(),
            closed: false,
        }
    }

    /// Impairs every datagram delivered to `addr`.
    pub fn set_conditions(&self, addr: SocketAddr, conditions: LinkConditions) {
        self.links().conditions.insert(addr, conditions);
    }

    pub fn pending(&self, addr: SocketAddr) -> usize {
        self.links().queues.get(&addr).map_or(0, VecDeque::len)
    }

    /// Reverses the inbox of `addr`, simulating out-of-order arrival.
    pub fn reorder(&self, addr: SocketAddr) {
        if let Some(queue) = self.links().queues.get_mut(&addr) {
            queue.make_contiguous().reverse();
        }
    }

    /// Enqueues a copy of the oldest datagram waiting for `addr`.
    pub fn duplicate_front(&self, addr: SocketAddr) -> bool {
        let mut links = self.links();
        let Some(queue) = links.queues.get_mut(&addr) else {
            return false;
        };
        match queue.front().cloned() {
            Some(datagram) => {
                queue.push_back(datagram);
                true
            }
            None => false,
        }
    }

    fn deliver(&self, from: SocketAddr, to: SocketAddr, data: &[u8]) -> bool {
        let mut links = self.links();
        let conditions = links.conditions.get(&to).copied().unwrap_or_default();
        let Some(queue) = links.queues.get_mut(&to) else {
            debug!("No endpoint bound at {}", to);
            return false;
        };
        if conditions.should_drop() {
            return false;
        }
        queue.push_back((data.to_vec(), from));
        if conditions.should_duplicate() {
            queue.push_back((data.to_vec(), from));
        }
        true
    }

    fn take(&self, addr: SocketAddr) -> Option<Datagram> {
        self.links().queues.get_mut(&addr)?.pop_front()
    }

    fn unbind(&self, addr: SocketAddr) {
        self.links().queues.remove(&addr);
    }

    fn links(&self) -> MutexGuard<'_, Links> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct MemoryTransport {
    addr: SocketAddr,
    network: MemoryNetwork,
    pool: MessagePool,
    stats: NetworkStats,
    closed: bool,
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &MessageBuffer, to: SocketAddr) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let data = message.payload();
        if data.len() > self.pool.message_capacity() {
            return Err(TransportError::Oversized {
                size: data.len(),
                limit: self.pool.message_capacity(),
            });
        }
        if !self.network.deliver(self.addr, to, data) {
            self.stats.record_dropped();
        }
        self.stats.record_sent(data.len());
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<PooledMessage>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        while let Some((data, from)) = self.network.take(self.addr) {
            let mut message = self.pool.obtain();
            if let Err(e) = message.fill_from(&data, from) {
                warn!("Dropping datagram from {}: {}", from, e);
                self.stats.record_dropped();
                continue;
            }
            self.stats.record_received(data.len());
            return Ok(Some(message));
        }
        Ok(None)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.network.unbind(self.addr);
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}
