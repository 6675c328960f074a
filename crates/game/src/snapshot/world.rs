use crate::codec::{BitBuffer, CodecError};
use crate::net::wire;

use super::entity::{ClientId, ClientState};

const PREALLOCATE_LIMIT: usize = 64;

/// Point-in-time authoritative state of every connected client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    states: Vec<ClientState>,
}

impl Snapshot {
    pub fn new(states: Vec<ClientState>) -> Self {
        Self { states }
    }

    pub fn state(&self, id: ClientId) -> Option<&ClientState> {
        self.states.iter().find(|state| state.id == id)
    }

    pub fn states(&self) -> &[ClientState] {
        &self.states
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientState> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        encode_states(buf, &self.states)
    }

    pub fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            states: decode_states(buf)?,
        })
    }
}

pub(crate) fn encode_states(buf: &mut BitBuffer, states: &[ClientState]) -> Result<(), CodecError> {
    wire::put_count(buf, states.len())?;
    for state in states {
        state.encode(buf)?;
    }
    Ok(())
}

pub(crate) fn decode_states(buf: &mut BitBuffer) -> Result<Vec<ClientState>, CodecError> {
    let count = wire::get_count(buf)?;
    let mut states = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
    for _ in 0..count {
        states.push(ClientState::decode(buf)?);
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::snapshot::Transform;

    #[test]
    fn lookup_by_id() {
        let snapshot = Snapshot::new(vec![
            ClientState::spawned(ClientId(4), Transform::default()),
            ClientState::spawned(ClientId(1), Transform::new(Vec3::X, glam::Quat::IDENTITY)),
        ]);
        assert_eq!(snapshot.state(ClientId(1)).unwrap().transform.position, Vec3::X);
        assert!(snapshot.state(ClientId(2)).is_none());
    }

    #[test]
    fn bogus_count_underruns_instead_of_allocating() {
        let mut buf = BitBuffer::with_capacity(16);
        buf.put_int(i32::MAX).unwrap();
        buf.flush();
        assert!(matches!(
            Snapshot::decode(&mut buf),
            Err(CodecError::BufferUnderrun { .. })
        ));
    }
}
