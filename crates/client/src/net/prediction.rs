use log::debug;

use volley::{
    Buttons, ClientInputLedger, ClientState, Locomotion, LocomotionCommand, Transform,
};

/// Locally predicted transform of the client's own entity plus its unacknowledged inputs.
#[derive(Debug, Default)]
pub struct ClientPrediction {
    transform: Transform,
    ledger: ClientInputLedger,
    corrections: u64,
}

impl ClientPrediction {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ledger: ClientInputLedger::new(),
            corrections: 0,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn ledger(&self) -> &ClientInputLedger {
        &self.ledger
    }

    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    pub fn batch(&self, limit: usize) -> Vec<LocomotionCommand> {
        self.ledger.batch(limit)
    }

    /// Records this tick's input and applies it at once, followed by one frame of passive force.
    pub fn predict<L: Locomotion>(
        &mut self,
        locomotion: &L,
        buttons: Buttons,
        dt: f32,
    ) -> LocomotionCommand {
        let command = self.ledger.record(buttons);
        if buttons.is_moving() {
            self.transform = locomotion.step(self.transform, &command, dt);
        }
        self.transform = locomotion.settle(self.transform, dt);
        command
    }

    /// Rebases on the server's view of this entity and replays every input it has not seen.
    /// Returns true when the predicted transform was replaced.
    pub fn reconcile<L: Locomotion>(
        &mut self,
        locomotion: &L,
        authoritative: &ClientState,
        dt: f32,
    ) -> bool {
        let Some(acknowledged) = authoritative.last_input else {
            return false;
        };
        self.ledger.discard_acknowledged(acknowledged);
        if !self.ledger.begin_reconcile(acknowledged) {
            return false;
        }

        let mut transform = authoritative.transform;
        for command in self.ledger.pending() {
            transform = locomotion.step(transform, &command, dt);
        }

        let drift = transform.position.distance(self.transform.position);
        if drift > f32::EPSILON {
            debug!("Reconciled after input {} with drift {:.4}", acknowledged, drift);
        }
        self.transform = transform;
        self.corrections += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use volley::{ClientId, KinematicMover};

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn acked(id: u32, transform: Transform) -> ClientState {
        ClientState {
            id: ClientId(0),
            last_input: Some(id),
            health: 100,
            transform,
        }
    }

    #[test]
    fn prediction_moves_immediately() {
        let mover = KinematicMover::default();
        let mut prediction = ClientPrediction::default();
        let command = prediction.predict(&mover, Buttons::FORWARD, DT);
        assert_eq!(command.id, 0);
        assert!(prediction.transform().position.z > 0.0);
        assert_eq!(prediction.ledger().len(), 1);
    }

    #[test]
    fn reconcile_replays_unacknowledged() {
        let mover = KinematicMover::default();
        let mut prediction = ClientPrediction::default();
        for _ in 0..5 {
            prediction.predict(&mover, Buttons::FORWARD, DT);
        }
        let predicted = prediction.transform();

        let mut server_view = Transform::default();
        for id in 0..3 {
            let command = LocomotionCommand::new(id, Buttons::FORWARD);
            server_view = mover.step(server_view, &command, DT);
        }

        assert!(prediction.reconcile(&mover, &acked(2, server_view), DT));
        assert_eq!(prediction.ledger().len(), 2);
        assert!((prediction.transform().position - predicted.position).length() < 1e-4);
    }

    #[test]
    fn server_correction_overrides_prediction() {
        let mover = KinematicMover::default();
        let mut prediction = ClientPrediction::default();
        prediction.predict(&mover, Buttons::FORWARD, DT);
        prediction.predict(&mover, Buttons::FORWARD, DT);

        let teleported = Transform::new(Vec3::new(50.0, 0.0, 0.0), glam::Quat::IDENTITY);
        assert!(prediction.reconcile(&mover, &acked(0, teleported), DT));
        let position = prediction.transform().position;
        assert_eq!(position.x, 50.0);
        assert!((position.z - 8.0 * DT).abs() < 1e-5);
    }

    #[test]
    fn stale_acknowledgement_is_ignored() {
        let mover = KinematicMover::default();
        let mut prediction = ClientPrediction::default();
        for _ in 0..4 {
            prediction.predict(&mover, Buttons::FORWARD, DT);
        }
        assert!(prediction.reconcile(&mover, &acked(2, Transform::default()), DT));
        let after = prediction.transform();

        assert!(!prediction.reconcile(&mover, &acked(1, Transform::default()), DT));
        assert!(!prediction.reconcile(&mover, &acked(2, Transform::default()), DT));
        assert_eq!(prediction.transform(), after);
        assert_eq!(prediction.corrections(), 1);

        let mut unacked = acked(0, Transform::default());
        unacked.last_input = None;
        assert!(!prediction.reconcile(&mover, &unacked, DT));
    }
}
