use std::collections::BTreeMap;

use super::command::{Buttons, LocomotionCommand, SequenceId};

/// Commands the client has issued but the server has not yet acknowledged.
#[derive(Debug, Default)]
pub struct ClientInputLedger {
    pending: BTreeMap<SequenceId, Buttons>,
    next_id: SequenceId,
    acknowledged: Option<SequenceId>,
    reconcile_base: Option<SequenceId>,
}

impl ClientInputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, buttons: Buttons) -> LocomotionCommand {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, buttons);
        LocomotionCommand::new(id, buttons)
    }

    /// The oldest `limit` unacknowledged commands in ascending id order; resent each tick.
    pub fn batch(&self, limit: usize) -> Vec<LocomotionCommand> {
        self.pending().take(limit).collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = LocomotionCommand> + '_ {
        self.pending
            .iter()
            .map(|(&id, &buttons)| LocomotionCommand::new(id, buttons))
    }

    pub fn discard_acknowledged(&mut self, acknowledged: SequenceId) {
        if self.acknowledged.is_some_and(|current| current >= acknowledged) {
            return;
        }
        self.acknowledged = Some(acknowledged);
        self.pending.retain(|&id, _| id > acknowledged);
    }

    /// True when `acknowledged` is newer than the last reconciliation base, which it then becomes.
    pub fn begin_reconcile(&mut self, acknowledged: SequenceId) -> bool {
        if self.reconcile_base.is_some_and(|base| base >= acknowledged) {
            return false;
        }
        self.reconcile_base = Some(acknowledged);
        true
    }

    pub fn acknowledged(&self) -> Option<SequenceId> {
        self.acknowledged
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Commands received from one client that have not yet been applied.
#[derive(Debug, Default)]
pub struct ServerInputLedger {
    pending: BTreeMap<SequenceId, Buttons>,
    last_processed: Option<SequenceId>,
}

impl ServerInputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits commands newer than the last processed id; duplicates are ignored.
    /// Returns how many were admitted.
    pub fn merge(&mut self, commands: &[LocomotionCommand]) -> usize {
        let mut admitted = 0;
        for command in commands {
            if self.last_processed.is_some_and(|last| command.id <= last) {
                continue;
            }
            if self.pending.contains_key(&command.id) {
                continue;
            }
            self.pending.insert(command.id, command.buttons);
            admitted += 1;
        }
        admitted
    }

    pub fn drain_ready(&mut self) -> Vec<LocomotionCommand> {
        let ready: Vec<LocomotionCommand> = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(id, buttons)| LocomotionCommand::new(id, buttons))
            .collect();
        if let Some(last) = ready.last() {
            self.last_processed = Some(last.id);
        }
        ready
    }

    pub fn last_processed(&self) -> Option<SequenceId> {
        self.last_processed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(commands: &[LocomotionCommand]) -> Vec<SequenceId> {
        commands.iter().map(|c| c.id).collect()
    }

    #[test]
    fn client_ids_increase_from_zero() {
        let mut ledger = ClientInputLedger::new();
        assert_eq!(ledger.record(Buttons::FORWARD).id, 0);
        assert_eq!(ledger.record(Buttons::LEFT).id, 1);
        assert_eq!(ledger.record(Buttons::empty()).id, 2);
        assert_eq!(ids(&ledger.batch(usize::MAX)), vec![0, 1, 2]);
        assert_eq!(ids(&ledger.batch(2)), vec![0, 1]);
    }

    #[test]
    fn client_discard_is_monotonic() {
        let mut ledger = ClientInputLedger::new();
        for _ in 0..6 {
            ledger.record(Buttons::FORWARD);
        }

        ledger.discard_acknowledged(3);
        assert_eq!(ids(&ledger.batch(usize::MAX)), vec![4, 5]);

        ledger.discard_acknowledged(1);
        assert_eq!(ids(&ledger.batch(usize::MAX)), vec![4, 5]);
        assert_eq!(ledger.acknowledged(), Some(3));

        ledger.record(Buttons::RIGHT);
        ledger.discard_acknowledged(5);
        assert_eq!(ids(&ledger.batch(usize::MAX)), vec![6]);
    }

    #[test]
    fn reconcile_base_only_advances() {
        let mut ledger = ClientInputLedger::new();
        assert!(ledger.begin_reconcile(0));
        assert!(!ledger.begin_reconcile(0));
        assert!(ledger.begin_reconcile(4));
        assert!(!ledger.begin_reconcile(2));
    }

    #[test]
    fn server_merge_is_idempotent() {
        let batch: Vec<_> = (0..3)
            .map(|id| LocomotionCommand::new(id, Buttons::FORWARD))
            .collect();

        let mut ledger = ServerInputLedger::new();
        assert_eq!(ledger.merge(&batch), 3);
        assert_eq!(ledger.merge(&batch), 0);
        assert_eq!(ids(&ledger.drain_ready()), vec![0, 1, 2]);
        assert_eq!(ledger.last_processed(), Some(2));

        assert_eq!(ledger.merge(&batch), 0);
        assert!(ledger.drain_ready().is_empty());
        assert_eq!(ledger.last_processed(), Some(2));
    }

    #[test]
    fn server_drains_in_id_order() {
        let mut ledger = ServerInputLedger::new();
        ledger.merge(&[
            LocomotionCommand::new(2, Buttons::LEFT),
            LocomotionCommand::new(0, Buttons::FORWARD),
        ]);
        ledger.merge(&[
            LocomotionCommand::new(1, Buttons::RIGHT),
            LocomotionCommand::new(2, Buttons::LEFT),
        ]);
        let drained = ledger.drain_ready();
        assert_eq!(ids(&drained), vec![0, 1, 2]);
        assert_eq!(drained[1].buttons, Buttons::RIGHT);
    }
}
