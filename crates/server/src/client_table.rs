use std::collections::HashMap;
use std::net::SocketAddr;

use volley::{ClientId, ClientState, STARTING_HEALTH, ServerInputLedger, ShotWatermark, Transform};

#[derive(Debug)]
pub struct ClientRecord {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub transform: Transform,
    pub health: i32,
    pub inputs: ServerInputLedger,
    pub shots: ShotWatermark,
}

impl ClientRecord {
    fn new(id: ClientId, addr: SocketAddr, transform: Transform) -> Self {
        Self {
            id,
            addr,
            transform,
            health: STARTING_HEALTH,
            inputs: ServerInputLedger::new(),
            shots: ShotWatermark::default(),
        }
    }

    pub fn state(&self) -> ClientState {
        ClientState {
            id: self.id,
            last_input: self.inputs.last_processed(),
            health: self.health,
            transform: self.transform,
        }
    }

    pub fn is_eliminated(&self) -> bool {
        self.health <= 0
    }
}

/// Joined clients, addressed by id through an explicit slot map and by network address.
#[derive(Debug, Default)]
pub struct ClientTable {
    records: Vec<ClientRecord>,
    slots: HashMap<ClientId, usize>,
    by_addr: HashMap<SocketAddr, ClientId>,
    joins: u32,
}

impl ClientTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are the join count at insertion time and are never reused.
    pub fn insert(&mut self, addr: SocketAddr, transform: Transform) -> ClientId {
        let id = ClientId(self.joins);
        self.joins += 1;
        self.slots.insert(id, self.records.len());
        self.by_addr.insert(addr, id);
        self.records.push(ClientRecord::new(id, addr, transform));
        id
    }

    pub fn get(&self, id: ClientId) -> Option<&ClientRecord> {
        self.slots.get(&id).map(|&slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut ClientRecord> {
        self.slots.get(&id).map(|&slot| &mut self.records[slot])
    }

    pub fn id_for(&self, addr: SocketAddr) -> Option<ClientId> {
        self.by_addr.get(&addr).copied()
    }

    /// True when `id` joined from `addr`.
    pub fn owns(&self, id: ClientId, addr: SocketAddr) -> bool {
        self.id_for(addr) == Some(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClientRecord> {
        self.records.iter_mut()
    }

    pub fn states(&self) -> Vec<ClientState> {
        self.records.iter().map(ClientRecord::state).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
