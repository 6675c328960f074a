mod command;
mod ledger;
mod locomotion;
mod tick;

pub use command::{Buttons, LocomotionCommand, SequenceId};
pub use ledger::{ClientInputLedger, ServerInputLedger};
pub use locomotion::{KinematicMover, Locomotion, MovementConfig};
pub use tick::FixedTimestep;
