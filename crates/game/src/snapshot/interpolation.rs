use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::buffer::{MAX_BUFFERED_SNAPSHOTS, MIN_BUFFERED_SNAPSHOTS};
use super::entity::{ClientId, ClientState, Transform};
use super::world::Snapshot;

pub const DEFAULT_SNAPSHOT_RATE: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    pub min_buffered_snapshots: usize,
    pub max_buffered_snapshots: usize,
    pub snapshot_rate: u32,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            min_buffered_snapshots: MIN_BUFFERED_SNAPSHOTS,
            max_buffered_snapshots: MAX_BUFFERED_SNAPSHOTS,
            snapshot_rate: DEFAULT_SNAPSHOT_RATE,
        }
    }
}

impl InterpolationConfig {
    pub fn send_interval(&self) -> f32 {
        if self.snapshot_rate == 0 {
            return 0.0;
        }
        1.0 / self.snapshot_rate as f32
    }
}

/// Fraction of the send interval covered by `elapsed`, clamped to `[0, 1]`.
pub fn interpolation_ratio(elapsed: f32, send_interval: f32) -> f32 {
    if send_interval <= 0.0 {
        return 1.0;
    }
    (elapsed / send_interval).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteEntity {
    pub id: ClientId,
    pub health: i32,
    pub last_known: Transform,
    pub target: Transform,
    pub displayed: Transform,
}

impl RemoteEntity {
    fn adopt(state: &ClientState) -> Self {
        Self {
            id: state.id,
            health: state.health,
            last_known: state.transform,
            target: state.transform,
            displayed: state.transform,
        }
    }
}

/// Moves every remote entity from where it was shown toward the latest promoted snapshot.
#[derive(Debug)]
pub struct Interpolator {
    local: Option<ClientId>,
    entities: BTreeMap<ClientId, RemoteEntity>,
    elapsed: f32,
    send_interval: f32,
}

impl Interpolator {
    pub fn new(send_interval: f32) -> Self {
        Self {
            local: None,
            entities: BTreeMap::new(),
            elapsed: 0.0,
            send_interval,
        }
    }

    pub fn set_local(&mut self, id: ClientId) {
        self.local = Some(id);
        self.entities.remove(&id);
    }

    /// Starts tracking a newly announced entity. Ids already tracked keep their current state.
    pub fn track(&mut self, state: &ClientState) {
        if Some(state.id) == self.local {
            return;
        }
        self.entities
            .entry(state.id)
            .or_insert_with(|| RemoteEntity::adopt(state));
    }

    /// One tick: advances the clock, applies a freshly promoted snapshot if any, then blends.
    pub fn advance(&mut self, dt: f32, promoted: Option<&Snapshot>) {
        self.elapsed += dt;
        if let Some(snapshot) = promoted {
            self.apply(snapshot);
        }

        let t = self.ratio();
        for entity in self.entities.values_mut() {
            entity.displayed = entity.last_known.interpolate(&entity.target, t);
        }
    }

    pub fn ratio(&self) -> f32 {
        interpolation_ratio(self.elapsed, self.send_interval)
    }

    pub fn remote(&self, id: ClientId) -> Option<&RemoteEntity> {
        self.entities.get(&id)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn apply(&mut self, snapshot: &Snapshot) {
        self.elapsed = 0.0;
        for entity in self.entities.values_mut() {
            entity.last_known = entity.displayed;
            entity.target = entity.displayed;
        }

        for state in snapshot.iter() {
            if Some(state.id) == self.local {
                continue;
            }
            self.entities
                .entry(state.id)
                .and_modify(|entity| {
                    entity.target = state.transform;
                    entity.health = state.health;
                })
                .or_insert_with(|| RemoteEntity::adopt(state));
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    const INTERVAL: f32 = 1.0 / 60.0;

    fn at(id: u32, x: f32) -> ClientState {
        ClientState::spawned(
            ClientId(id),
            Transform::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY),
        )
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(interpolation_ratio(-1.0, INTERVAL), 0.0);
        assert_eq!(interpolation_ratio(INTERVAL * 2.0, INTERVAL), 1.0);
        assert!((interpolation_ratio(INTERVAL / 2.0, INTERVAL) - 0.5).abs() < 1e-5);
        assert_eq!(interpolation_ratio(0.3, 0.0), 1.0);
        assert_eq!(interpolation_ratio(0.3, -1.0), 1.0);
    }

    #[test]
    fn blends_toward_promoted_snapshot() {
        let mut interpolator = Interpolator::new(INTERVAL);
        interpolator.track(&at(1, 0.0));

        let snapshot = Snapshot::new(vec![at(1, 6.0)]);
        interpolator.advance(INTERVAL, Some(&snapshot));
        assert_eq!(interpolator.remote(ClientId(1)).unwrap().displayed.position.x, 0.0);

        interpolator.advance(INTERVAL / 2.0, None);
        let halfway = interpolator.remote(ClientId(1)).unwrap().displayed.position.x;
        assert!((halfway - 3.0).abs() < 1e-3);

        for _ in 0..10 {
            interpolator.advance(INTERVAL, None);
        }
        assert_eq!(interpolator.remote(ClientId(1)).unwrap().displayed.position.x, 6.0);
    }

    #[test]
    fn next_promotion_starts_from_displayed() {
        let mut interpolator = Interpolator::new(INTERVAL);
        interpolator.track(&at(1, 0.0));
        interpolator.advance(0.0, Some(&Snapshot::new(vec![at(1, 10.0)])));
        interpolator.advance(INTERVAL / 2.0, None);

        interpolator.advance(0.0, Some(&Snapshot::new(vec![at(1, 20.0)])));
        let entity = interpolator.remote(ClientId(1)).unwrap();
        assert!((entity.last_known.position.x - 5.0).abs() < 1e-3);
        assert_eq!(entity.target.position.x, 20.0);
    }

    #[test]
    fn local_entity_is_excluded_and_unknown_adopted() {
        let mut interpolator = Interpolator::new(INTERVAL);
        interpolator.set_local(ClientId(0));
        interpolator.track(&at(0, 1.0));
        assert!(interpolator.is_empty());

        let mut hurt = at(2, 4.0);
        hurt.health = 40;
        interpolator.advance(INTERVAL, Some(&Snapshot::new(vec![at(0, 9.0), hurt])));
        assert!(interpolator.remote(ClientId(0)).is_none());
        let adopted = interpolator.remote(ClientId(2)).unwrap();
        assert_eq!(adopted.displayed.position.x, 4.0);
        assert_eq!(adopted.health, 40);
    }

    #[test]
    fn repeated_announcement_keeps_tracked_state() {
        let mut interpolator = Interpolator::new(INTERVAL);
        interpolator.track(&at(1, 0.0));

        let mut moved = at(1, 10.0);
        moved.health = 0;
        interpolator.advance(INTERVAL, Some(&Snapshot::new(vec![moved])));
        interpolator.advance(INTERVAL, None);

        interpolator.track(&at(1, 0.0));
        let entity = interpolator.remote(ClientId(1)).unwrap();
        assert_eq!(entity.displayed.position.x, 10.0);
        assert_eq!(entity.health, 0);
    }
}
