use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::command::{Buttons, LocomotionCommand};
use crate::snapshot::Transform;

/// Capability that moves an entity. The server and client prediction must share one.
pub trait Locomotion {
    fn step(&self, transform: Transform, command: &LocomotionCommand, dt: f32) -> Transform;

    /// Passive force applied once per tick after any commands.
    fn settle(&self, transform: Transform, dt: f32) -> Transform;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub move_speed: f32,
    pub turn_speed_degrees: f32,
    pub gravity: f32,
    pub ground_height: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            turn_speed_degrees: 50.0,
            gravity: -9.81,
            ground_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KinematicMover {
    config: MovementConfig,
}

impl KinematicMover {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }
}

impl Locomotion for KinematicMover {
    fn step(&self, transform: Transform, command: &LocomotionCommand, dt: f32) -> Transform {
        let buttons = command.buttons;
        let mut next = transform;

        let speed = self.config.move_speed * dt;
        if buttons.contains(Buttons::FORWARD) {
            next.position += transform.forward() * speed;
        } else if buttons.contains(Buttons::BACKWARD) {
            next.position -= transform.forward() * speed;
        }

        let turn = self.config.turn_speed_degrees.to_radians() * dt;
        if buttons.contains(Buttons::LEFT) {
            next.rotation = transform.rotation * Quat::from_rotation_y(-turn);
        } else if buttons.contains(Buttons::RIGHT) {
            next.rotation = transform.rotation * Quat::from_rotation_y(turn);
        }

        next
    }

    fn settle(&self, transform: Transform, dt: f32) -> Transform {
        let mut next = transform;
        next.position += Vec3::Y * self.config.gravity * dt;
        next.position.y = next.position.y.max(self.config.ground_height);
        next
    }
}
