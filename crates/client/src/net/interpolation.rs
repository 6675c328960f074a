use volley::snapshot::channel;
use volley::{
    ClientId, ClientState, InterpolationConfig, Interpolator, RemoteEntity, Snapshot,
    SnapshotSender, SnapshotStore, Transform,
};

/// Couples the snapshot jitter buffer with interpolation of every other client.
#[derive(Debug)]
pub struct RemoteEntities {
    store: SnapshotStore,
    interpolator: Interpolator,
}

impl RemoteEntities {
    pub fn new(config: &InterpolationConfig) -> (SnapshotSender, Self) {
        let (tx, store) = channel(config.min_buffered_snapshots, config.max_buffered_snapshots);
        let remotes = Self {
            store,
            interpolator: Interpolator::new(config.send_interval()),
        };
        (tx, remotes)
    }

    pub fn set_local(&mut self, id: ClientId) {
        self.interpolator.set_local(id);
    }

    pub fn track(&mut self, state: &ClientState) {
        self.interpolator.track(state);
    }

    /// Runs one tick and hands back the snapshot promoted on it, if any.
    pub fn advance(&mut self, dt: f32) -> Option<Snapshot> {
        let promoted = self.store.promote();
        self.interpolator.advance(dt, promoted.as_ref());
        promoted
    }

    pub fn get(&self, id: ClientId) -> Option<&RemoteEntity> {
        self.interpolator.remote(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.interpolator.remotes()
    }

    /// Displayed transforms of every remote entity still standing.
    pub fn targets(&self) -> Vec<(ClientId, Transform)> {
        self.iter()
            .filter(|entity| entity.health > 0)
            .map(|entity| (entity.id, entity.displayed))
            .collect()
    }

    pub fn buffered(&mut self) -> usize {
        self.store.depth()
    }

    pub fn len(&self) -> usize {
        self.interpolator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interpolator.is_empty()
    }
}
