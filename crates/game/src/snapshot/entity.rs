use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::codec::{BitBuffer, CodecError};
use crate::net::wire;
use crate::simulation::SequenceId;

pub const STARTING_HEALTH: i32 = 100;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub const WIRE_BITS: usize = 7 * 32;

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Position lerp and shortest-arc orientation slerp; `t` is clamped to `[0, 1]`.
    pub fn interpolate(&self, target: &Transform, t: f32) -> Transform {
        let t = t.clamp(0.0, 1.0);
        let mut to = target.rotation;
        if self.rotation.dot(to) < 0.0 {
            to = -to;
        }
        Transform {
            position: self.position.lerp(target.position, t),
            rotation: self.rotation.slerp(to, t),
        }
    }

    pub fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        for value in self.position.to_array() {
            buf.put_float(value)?;
        }
        for value in self.rotation.to_array() {
            buf.put_float(value)?;
        }
        Ok(())
    }

    /// Orientation is read back as sent; no normalization.
    pub fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        let position = Vec3::new(buf.get_float()?, buf.get_float()?, buf.get_float()?);
        let rotation = Quat::from_xyzw(
            buf.get_float()?,
            buf.get_float()?,
            buf.get_float()?,
            buf.get_float()?,
        );
        Ok(Self { position, rotation })
    }
}

/// One entity's authoritative state as carried by Join, JoinBroadcast and Snapshot messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientState {
    pub id: ClientId,
    pub last_input: Option<SequenceId>,
    pub health: i32,
    pub transform: Transform,
}

impl ClientState {
    pub const WIRE_BITS: usize = 3 * wire::FIELD_BITS + Transform::WIRE_BITS;

    pub fn spawned(id: ClientId, transform: Transform) -> Self {
        Self {
            id,
            last_input: None,
            health: STARTING_HEALTH,
            transform,
        }
    }

    pub fn is_eliminated(&self) -> bool {
        self.health <= 0
    }

    pub fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        wire::put_id(buf, self.id.0)?;
        wire::put_mark(buf, self.last_input)?;
        buf.put_int(self.health)?;
        self.transform.encode(buf)
    }

    pub fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        let id = ClientId(wire::get_id(buf)?);
        let last_input = wire::get_mark(buf)?;
        let health = buf.get_int()?;
        let transform = Transform::decode(buf)?;
        Ok(Self {
            id,
            last_input,
            health,
            transform,
        })
    }
}
