use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::codec::{BitBuffer, CodecError};

pub const MESSAGE_CAPACITY: usize = 8 * 1024;
pub const DEFAULT_MAX_IDLE: usize = 256;

/// A bit buffer plus the address it arrived from.
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    buffer: BitBuffer,
    sender: Option<SocketAddr>,
}

impl MessageBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: BitBuffer::with_capacity(capacity),
            sender: None,
        }
    }

    pub fn buffer(&self) -> &BitBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut BitBuffer {
        &mut self.buffer
    }

    pub fn sender(&self) -> Option<SocketAddr> {
        self.sender
    }

    pub fn set_sender(&mut self, addr: SocketAddr) {
        self.sender = Some(addr);
    }

    pub fn payload(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn fill_from(&mut self, data: &[u8], from: SocketAddr) -> Result<(), CodecError> {
        self.buffer.load(data)?;
        self.sender = Some(from);
        Ok(())
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sender = None;
    }
}

#[derive(Debug)]
struct PoolInner {
    idle: Mutex<Vec<MessageBuffer>>,
    message_capacity: usize,
    max_idle: usize,
}

/// Shared free list of message buffers. Clones refer to the same pool.
#[derive(Debug, Clone)]
pub struct MessagePool {
    inner: Arc<PoolInner>,
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new(MESSAGE_CAPACITY, DEFAULT_MAX_IDLE)
    }
}

impl MessagePool {
    pub fn new(message_capacity: usize, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(Vec::new()),
                message_capacity,
                max_idle,
            }),
        }
    }

    pub fn obtain(&self) -> PooledMessage {
        let message = self
            .idle()
            .pop()
            .unwrap_or_else(|| MessageBuffer::new(self.inner.message_capacity));
        PooledMessage {
            message,
            pool: self.clone(),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }

    pub fn message_capacity(&self) -> usize {
        self.inner.message_capacity
    }

    fn release(&self, mut message: MessageBuffer) {
        message.reset();
        let mut idle = self.idle();
        if idle.len() < self.inner.max_idle {
            idle.push(message);
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<MessageBuffer>> {
        self.inner.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Checked-out message; returns to its pool, cleared, when dropped.
#[derive(Debug)]
pub struct PooledMessage {
    message: MessageBuffer,
    pool: MessagePool,
}

impl PooledMessage {
    pub fn free(self) {}
}

impl Deref for PooledMessage {
    type Target = MessageBuffer;

    fn deref(&self) -> &MessageBuffer {
        &self.message
    }
}

impl DerefMut for PooledMessage {
    fn deref_mut(&mut self) -> &mut MessageBuffer {
        &mut self.message
    }
}

impl Drop for PooledMessage {
    fn drop(&mut self) {
        let message = std::mem::replace(&mut self.message, MessageBuffer::new(0));
        self.pool.release(message);
    }
}
