use std::collections::VecDeque;

use log::debug;

use crate::net::{HitReport, ReportedShot};
use crate::simulation::SequenceId;
use crate::snapshot::ClientId;

pub const SHOT_TTL_SECONDS: f32 = 2.0;
pub const SCORE_PER_HIT: u32 = 10;
pub const HIT_DAMAGE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub id: SequenceId,
    pub shooter: ClientId,
    pub target: ClientId,
    pub ttl: f32,
}

/// Client-side record of hits waiting for the server's acknowledgement.
#[derive(Debug)]
pub struct ShotLedger {
    shots: VecDeque<Shot>,
    next_id: SequenceId,
    ttl: f32,
    score: u32,
}

impl Default for ShotLedger {
    fn default() -> Self {
        Self::new(SHOT_TTL_SECONDS)
    }
}

impl ShotLedger {
    pub fn new(ttl: f32) -> Self {
        Self {
            shots: VecDeque::new(),
            next_id: 0,
            ttl,
            score: 0,
        }
    }

    pub fn record(&mut self, shooter: ClientId, target: ClientId) -> SequenceId {
        let id = self.next_id;
        self.next_id += 1;
        self.shots.push_back(Shot {
            id,
            shooter,
            target,
            ttl: self.ttl,
        });
        id
    }

    /// Ages every pending shot and forgets the ones past their lifetime.
    pub fn expire(&mut self, dt: f32) -> usize {
        let before = self.shots.len();
        self.shots.retain_mut(|shot| {
            shot.ttl -= dt;
            shot.ttl > 0.0
        });
        let expired = before - self.shots.len();
        if expired > 0 {
            debug!("{} unacknowledged shots expired", expired);
        }
        expired
    }

    pub fn report(&self, shooter: ClientId) -> Option<HitReport> {
        if self.shots.is_empty() {
            return None;
        }
        Some(HitReport {
            shooter,
            shots: self
                .shots
                .iter()
                .map(|shot| ReportedShot {
                    id: shot.id,
                    target: shot.target,
                })
                .collect(),
        })
    }

    /// Discards shots up to `mark`, crediting score for each one discarded.
    pub fn acknowledge(&mut self, mark: Option<SequenceId>) -> u32 {
        let Some(mark) = mark else {
            return 0;
        };
        let before = self.shots.len();
        self.shots.retain(|shot| shot.id > mark);
        let credited = (before - self.shots.len()) as u32 * SCORE_PER_HIT;
        self.score += credited;
        credited
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pending(&self) -> impl Iterator<Item = &Shot> {
        self.shots.iter()
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

/// Server-side per-shooter high-water mark; each shot id is admitted at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotWatermark {
    last: Option<SequenceId>,
}

impl ShotWatermark {
    pub fn admit(&mut self, id: SequenceId) -> bool {
        if self.last.is_some_and(|last| id <= last) {
            return false;
        }
        self.last = Some(id);
        true
    }

    pub fn last(&self) -> Option<SequenceId> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_pending_shots() {
        let mut ledger = ShotLedger::default();
        assert!(ledger.report(ClientId(0)).is_none());

        assert_eq!(ledger.record(ClientId(0), ClientId(1)), 0);
        assert_eq!(ledger.record(ClientId(0), ClientId(2)), 1);
        let report = ledger.report(ClientId(0)).unwrap();
        assert_eq!(report.shots.len(), 2);
        assert_eq!(report.shots[1].target, ClientId(2));
    }

    #[test]
    fn shots_expire_after_ttl() {
        let mut ledger = ShotLedger::default();
        ledger.record(ClientId(0), ClientId(1));
        assert_eq!(ledger.expire(1.5), 0);
        ledger.record(ClientId(0), ClientId(1));
        assert_eq!(ledger.expire(0.6), 1);
        assert_eq!(ledger.pending().next().unwrap().id, 1);
    }

    #[test]
    fn acknowledgement_credits_discarded_shots() {
        let mut ledger = ShotLedger::default();
        for _ in 0..3 {
            ledger.record(ClientId(0), ClientId(1));
        }
        assert_eq!(ledger.acknowledge(None), 0);
        assert_eq!(ledger.acknowledge(Some(1)), 2 * SCORE_PER_HIT);
        assert_eq!(ledger.acknowledge(Some(1)), 0);
        assert_eq!(ledger.score(), 20);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn watermark_admits_once() {
        let mut mark = ShotWatermark::default();
        assert!(mark.admit(0));
        assert!(!mark.admit(0));
        assert!(mark.admit(3));
        assert!(!mark.admit(2));
        assert_eq!(mark.last(), Some(3));
    }
}
