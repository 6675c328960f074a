use crate::codec::{BitBuffer, CodecError, bits_required};
use crate::simulation::{LocomotionCommand, SequenceId};
use crate::snapshot::{ClientId, ClientState, Snapshot, decode_states, encode_states};

use super::pool::{MessagePool, PooledMessage};
use super::wire;

pub const DEFAULT_PORT: u16 = 27015;
pub const DEFAULT_TICK_RATE: u32 = 60;

const PREALLOCATE_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    Join = 0,
    JoinBroadcast = 1,
    Input = 2,
    Snapshot = 3,
    Hit = 4,
}

impl EventKind {
    pub const COUNT: u32 = 5;
    pub const WIRE_BITS: usize = bits_required((Self::COUNT - 1) as u64) as usize;

    pub fn write(self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        buf.put_enum(self as u32, Self::COUNT)
    }

    pub fn read(buf: &mut BitBuffer) -> Result<Self, ProtocolError> {
        let raw = buf.get_bits(Self::WIRE_BITS as u32)?;
        Self::try_from(raw)
    }
}

impl TryFrom<u32> for EventKind {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Join),
            1 => Ok(Self::JoinBroadcast),
            2 => Ok(Self::Input),
            3 => Ok(Self::Snapshot),
            4 => Ok(Self::Hit),
            other => Err(ProtocolError::UnknownEventKind(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Server,
    Client,
}

pub fn accepts(role: Role, kind: EventKind) -> bool {
    match role {
        Role::Server => matches!(kind, EventKind::Join | EventKind::Input | EventKind::Hit),
        Role::Client => matches!(
            kind,
            EventKind::Join | EventKind::JoinBroadcast | EventKind::Snapshot | EventKind::Hit
        ),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown event kind {0}")]
    UnknownEventKind(u32),
    #[error("{kind:?} is not handled by the {role:?} role")]
    UnexpectedEventKind { kind: EventKind, role: Role },
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputBatch {
    pub sender: ClientId,
    pub commands: Vec<LocomotionCommand>,
}

impl InputBatch {
    /// Most commands one batch can carry in a message of `message_bytes`.
    pub fn max_commands(message_bytes: usize) -> usize {
        let fixed = EventKind::WIRE_BITS + 2 * wire::FIELD_BITS;
        (message_bytes * 8).saturating_sub(fixed) / LocomotionCommand::WIRE_BITS
    }

    fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        wire::put_id(buf, self.sender.0)?;
        wire::put_count(buf, self.commands.len())?;
        for command in &self.commands {
            command.encode(buf)?;
        }
        Ok(())
    }

    fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        let sender = ClientId(wire::get_id(buf)?);
        let count = wire::get_count(buf)?;
        let mut commands = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
        for _ in 0..count {
            commands.push(LocomotionCommand::decode(buf)?);
        }
        Ok(Self { sender, commands })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedShot {
    pub id: SequenceId,
    pub target: ClientId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitReport {
    pub shooter: ClientId,
    pub shots: Vec<ReportedShot>,
}

impl HitReport {
    fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        wire::put_id(buf, self.shooter.0)?;
        wire::put_count(buf, self.shots.len())?;
        for shot in &self.shots {
            wire::put_id(buf, shot.id)?;
            wire::put_id(buf, shot.target.0)?;
        }
        Ok(())
    }

    fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        let shooter = ClientId(wire::get_id(buf)?);
        let count = wire::get_count(buf)?;
        let mut shots = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
        for _ in 0..count {
            let id = wire::get_id(buf)?;
            let target = ClientId(wire::get_id(buf)?);
            shots.push(ReportedShot { id, target });
        }
        Ok(Self { shooter, shots })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinAccepted {
    pub own: ClientState,
    pub others: Vec<ClientState>,
}

/// Messages a client sends and the server handles.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerBound {
    Join,
    Input(InputBatch),
    Hit(HitReport),
}

impl ServerBound {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Join => EventKind::Join,
            Self::Input(_) => EventKind::Input,
            Self::Hit(_) => EventKind::Hit,
        }
    }

    pub fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        self.kind().write(buf)?;
        match self {
            Self::Join => Ok(()),
            Self::Input(batch) => batch.encode(buf),
            Self::Hit(report) => report.encode(buf),
        }
    }

    pub fn decode(buf: &mut BitBuffer) -> Result<Self, ProtocolError> {
        let kind = expect_kind(buf, Role::Server)?;
        let message = match kind {
            EventKind::Join => Self::Join,
            EventKind::Input => Self::Input(InputBatch::decode(buf)?),
            EventKind::Hit => Self::Hit(HitReport::decode(buf)?),
            EventKind::JoinBroadcast | EventKind::Snapshot => {
                return Err(ProtocolError::UnexpectedEventKind {
                    kind,
                    role: Role::Server,
                });
            }
        };
        Ok(message)
    }

    pub fn to_message(&self, pool: &MessagePool) -> Result<PooledMessage, CodecError> {
        pack(pool, |buf| self.encode(buf))
    }
}

/// Messages the server sends and a client handles.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientBound {
    JoinAccepted(JoinAccepted),
    JoinBroadcast(ClientState),
    Snapshot(Snapshot),
    HitAck(Option<SequenceId>),
}

impl ClientBound {
    /// Most client states a Snapshot or Join response can carry in a message of `message_bytes`.
    pub fn max_states(message_bytes: usize) -> usize {
        let fixed = EventKind::WIRE_BITS + wire::FIELD_BITS;
        (message_bytes * 8).saturating_sub(fixed) / ClientState::WIRE_BITS
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::JoinAccepted(_) => EventKind::Join,
            Self::JoinBroadcast(_) => EventKind::JoinBroadcast,
            Self::Snapshot(_) => EventKind::Snapshot,
            Self::HitAck(_) => EventKind::Hit,
        }
    }

    pub fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        self.kind().write(buf)?;
        match self {
            Self::JoinAccepted(accepted) => {
                accepted.own.encode(buf)?;
                encode_states(buf, &accepted.others)
            }
            Self::JoinBroadcast(state) => state.encode(buf),
            Self::Snapshot(snapshot) => snapshot.encode(buf),
            Self::HitAck(mark) => wire::put_mark(buf, *mark),
        }
    }

    pub fn decode(buf: &mut BitBuffer) -> Result<Self, ProtocolError> {
        let kind = expect_kind(buf, Role::Client)?;
        let message = match kind {
            EventKind::Join => {
                let own = ClientState::decode(buf)?;
                let others = decode_states(buf)?;
                Self::JoinAccepted(JoinAccepted { own, others })
            }
            EventKind::JoinBroadcast => Self::JoinBroadcast(ClientState::decode(buf)?),
            EventKind::Snapshot => Self::Snapshot(Snapshot::decode(buf)?),
            EventKind::Hit => Self::HitAck(wire::get_mark(buf)?),
            EventKind::Input => {
                return Err(ProtocolError::UnexpectedEventKind {
                    kind,
                    role: Role::Client,
                });
            }
        };
        Ok(message)
    }

    pub fn to_message(&self, pool: &MessagePool) -> Result<PooledMessage, CodecError> {
        pack(pool, |buf| self.encode(buf))
    }
}

fn expect_kind(buf: &mut BitBuffer, role: Role) -> Result<EventKind, ProtocolError> {
    let kind = EventKind::read(buf)?;
    if !accepts(role, kind) {
        return Err(ProtocolError::UnexpectedEventKind { kind, role });
    }
    Ok(kind)
}

fn pack<F>(pool: &MessagePool, encode: F) -> Result<PooledMessage, CodecError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), CodecError>,
{
    let mut message = pool.obtain();
    encode(message.buffer_mut())?;
    message.buffer_mut().flush();
    Ok(message)
}
