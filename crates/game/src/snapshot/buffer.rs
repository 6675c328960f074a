use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;

use super::world::Snapshot;

pub const MIN_BUFFERED_SNAPSHOTS: usize = 3;
pub const MAX_BUFFERED_SNAPSHOTS: usize = 64;

/// Producer half held by the receive path.
#[derive(Debug)]
pub struct SnapshotSender {
    tx: Sender<Snapshot>,
}

impl SnapshotSender {
    /// Returns false once the store has been dropped.
    pub fn send(&self, snapshot: Snapshot) -> bool {
        self.tx.send(snapshot).is_ok()
    }
}

/// Arrival-ordered jitter buffer drained by the fixed-rate tick.
#[derive(Debug)]
pub struct SnapshotStore {
    rx: Receiver<Snapshot>,
    queue: VecDeque<Snapshot>,
    min_depth: usize,
    max_depth: usize,
    dropped: u64,
}

pub fn channel(min_depth: usize, max_depth: usize) -> (SnapshotSender, SnapshotStore) {
    let (tx, rx) = mpsc::channel();
    let min_depth = min_depth.max(1);
    let store = SnapshotStore {
        rx,
        queue: VecDeque::new(),
        min_depth,
        max_depth: max_depth.max(min_depth),
        dropped: 0,
    };
    (SnapshotSender { tx }, store)
}

impl SnapshotStore {
    /// Oldest buffered snapshot once at least `min_depth` are waiting; one per call.
    pub fn promote(&mut self) -> Option<Snapshot> {
        self.collect();
        if self.queue.len() >= self.min_depth {
            self.queue.pop_front()
        } else {
            None
        }
    }

    pub fn depth(&mut self) -> usize {
        self.collect();
        self.queue.len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.collect();
        self.queue.clear();
    }

    fn collect(&mut self) {
        while let Ok(snapshot) = self.rx.try_recv() {
            self.queue.push_back(snapshot);
            if self.queue.len() > self.max_depth {
                self.queue.pop_front();
                self.dropped += 1;
                debug!("snapshot buffer full, dropped oldest");
            }
        }
    }
}
