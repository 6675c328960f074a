use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::{Quat, Vec3};
use log::{debug, info, warn};

use volley::{
    ClientBound, ClientId, FixedTimestep, HIT_DAMAGE, HitReport, InputBatch, JoinAccepted,
    KinematicMover, Locomotion, MessagePool, NetworkStats, PooledMessage, ServerBound, Snapshot,
    Transform, Transport, UdpTransport,
};

use crate::client_table::{ClientRecord, ClientTable};
use crate::config::ServerConfig;
use crate::events::ServerEvent;

pub struct GameServer<T: Transport, L: Locomotion = KinematicMover> {
    transport: T,
    pool: MessagePool,
    locomotion: L,
    config: ServerConfig,
    clients: ClientTable,
    timestep: FixedTimestep,
    snapshot_timer: f32,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<ServerEvent>,
}

impl GameServer<UdpTransport, KinematicMover> {
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let pool = MessagePool::default();
        config
            .validate(pool.message_capacity())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let transport = UdpTransport::bind(config.bind_addr(), pool.clone())?;
        let locomotion = KinematicMover::new(config.movement);
        Ok(Self::new(transport, pool, locomotion, config))
    }
}

impl<T: Transport, L: Locomotion> GameServer<T, L> {
    pub fn new(transport: T, pool: MessagePool, locomotion: L, config: ServerConfig) -> Self {
        Self {
            transport,
            pool,
            locomotion,
            timestep: FixedTimestep::new(config.tick_rate),
            config,
            clients: ClientTable::new(),
            snapshot_timer: 0.0,
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn stats(&self) -> &NetworkStats {
        self.transport.stats()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn clients(&self) -> &ClientTable {
        &self.clients
    }

    pub fn client(&self, id: ClientId) -> Option<&ClientRecord> {
        self.clients.get(id)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn run(&mut self) {
        let mut last_update = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            let delta = (now - last_update).as_secs_f32();
            last_update = now;

            self.update(delta);
            std::thread::sleep(Duration::from_millis(1));
        }
        self.transport.close();
    }

    /// Drains the transport, then runs every fixed tick the elapsed time allows.
    pub fn update(&mut self, delta: f32) -> u32 {
        self.drain_incoming();
        self.timestep.accumulate(delta);

        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.tick();
            ticks_run += 1;
        }
        ticks_run
    }

    pub fn drain_incoming(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.transport.receive() {
                Ok(Some(message)) => {
                    self.handle_message(message);
                    handled += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    self.pending_events.push_back(ServerEvent::Error {
                        message: format!("Network error: {}", e),
                    });
                    break;
                }
            }
        }
        handled
    }

    pub fn tick(&mut self) {
        let dt = self.timestep.dt();
        let locomotion = &self.locomotion;
        for record in self.clients.iter_mut() {
            for command in record.inputs.drain_ready() {
                record.transform = locomotion.step(record.transform, &command, dt);
            }
            record.transform = locomotion.settle(record.transform, dt);
        }

        self.snapshot_timer += dt;
        if self.snapshot_timer >= self.config.snapshot_interval() {
            self.snapshot_timer = 0.0;
            self.broadcast_snapshot();
        }
    }

    fn handle_message(&mut self, mut message: PooledMessage) {
        let Some(from) = message.sender() else {
            return;
        };
        let decoded = ServerBound::decode(message.buffer_mut());
        message.free();

        match decoded {
            Ok(ServerBound::Join) => self.handle_join(from),
            Ok(ServerBound::Input(batch)) => self.handle_input(from, batch),
            Ok(ServerBound::Hit(report)) => self.handle_hit(from, report),
            Err(e) => self.drop_message(from, e.to_string()),
        }
    }

    fn handle_join(&mut self, from: SocketAddr) {
        if let Some(id) = self.clients.id_for(from) {
            debug!("Repeated join from {}, resending response to {}", from, id);
            self.send_join_response(id);
            return;
        }

        if self.clients.len() >= self.config.max_clients {
            warn!("Rejecting join from {}: server full", from);
            self.pending_events.push_back(ServerEvent::JoinRejected {
                addr: from,
                reason: "server full".to_string(),
            });
            return;
        }

        let spawn = self.spawn_point(self.clients.len());
        let id = self.clients.insert(from, spawn);
        info!("{} joined from {}", id, from);
        self.pending_events.push_back(ServerEvent::ClientJoined {
            client_id: id,
            addr: from,
        });

        self.send_join_response(id);
        if let Some(record) = self.clients.get(id) {
            let announcement = ClientBound::JoinBroadcast(record.state());
            self.broadcast(&announcement, Some(id));
        }
    }

    fn handle_input(&mut self, from: SocketAddr, batch: InputBatch) {
        if !self.clients.owns(batch.sender, from) {
            self.drop_message(from, format!("input for {} from foreign address", batch.sender));
            return;
        }
        if let Some(record) = self.clients.get_mut(batch.sender) {
            let admitted = record.inputs.merge(&batch.commands);
            debug!("{} sent {} new commands", batch.sender, admitted);
        }
    }

    fn handle_hit(&mut self, from: SocketAddr, report: HitReport) {
        if !self.clients.owns(report.shooter, from) {
            self.drop_message(from, format!("hit for {} from foreign address", report.shooter));
            return;
        }

        for shot in &report.shots {
            let Some(shooter) = self.clients.get_mut(report.shooter) else {
                return;
            };
            if !shooter.shots.admit(shot.id) {
                continue;
            }

            let Some(target) = self.clients.get_mut(shot.target) else {
                debug!("Shot {} names unknown target {}", shot.id, shot.target);
                continue;
            };
            let was_standing = !target.is_eliminated();
            target.health -= HIT_DAMAGE;
            if was_standing && target.is_eliminated() {
                info!("{} eliminated by {}", shot.target, report.shooter);
                self.pending_events.push_back(ServerEvent::ClientEliminated {
                    client_id: shot.target,
                    by: report.shooter,
                });
            }
        }

        let mark = self
            .clients
            .get(report.shooter)
            .and_then(|record| record.shots.last());
        self.send(&ClientBound::HitAck(mark), from);
    }

    fn send_join_response(&mut self, id: ClientId) {
        let Some(record) = self.clients.get(id) else {
            return;
        };
        let addr = record.addr;
        let accepted = ClientBound::JoinAccepted(JoinAccepted {
            own: record.state(),
            others: self
                .clients
                .iter()
                .filter(|other| other.id != id)
                .map(ClientRecord::state)
                .collect(),
        });
        self.send(&accepted, addr);
    }

    fn broadcast_snapshot(&mut self) {
        if self.clients.is_empty() {
            return;
        }
        let snapshot = ClientBound::Snapshot(Snapshot::new(self.clients.states()));
        self.broadcast(&snapshot, None);
    }

    fn broadcast(&mut self, message: &ClientBound, except: Option<ClientId>) {
        let packed = match message.to_message(&self.pool) {
            Ok(packed) => packed,
            Err(e) => {
                self.report_error(format!("Failed to encode {:?}: {}", message.kind(), e));
                return;
            }
        };
        let targets: Vec<SocketAddr> = self
            .clients
            .iter()
            .filter(|record| Some(record.id) != except)
            .map(|record| record.addr)
            .collect();
        for addr in targets {
            if let Err(e) = self.transport.send(&packed, addr) {
                self.report_error(format!("Failed to send to {}: {}", addr, e));
            }
        }
    }

    fn send(&mut self, message: &ClientBound, to: SocketAddr) {
        let result = message
            .to_message(&self.pool)
            .map_err(|e| e.to_string())
            .and_then(|packed| self.transport.send(&packed, to).map_err(|e| e.to_string()));
        if let Err(e) = result {
            self.report_error(format!("Failed to send {:?} to {}: {}", message.kind(), to, e));
        }
    }

    fn drop_message(&mut self, addr: SocketAddr, reason: String) {
        warn!("Dropping message from {}: {}", addr, reason);
        self.pending_events
            .push_back(ServerEvent::MessageDropped { addr, reason });
    }

    fn report_error(&mut self, message: String) {
        warn!("{}", message);
        self.pending_events.push_back(ServerEvent::Error { message });
    }

    fn spawn_point(&self, slot: usize) -> Transform {
        let offset = slot as f32 * self.config.spawn_spacing;
        Transform::new(Vec3::new(offset, 0.0, 0.0), Quat::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley::{Buttons, LocomotionCommand, MemoryNetwork, MemoryTransport, ReportedShot};

    const SERVER: ([u8; 4], u16) = ([10, 0, 0, 1], 27015);

    struct Harness {
        network: MemoryNetwork,
        pool: MessagePool,
        server: GameServer<MemoryTransport>,
    }

    impl Harness {
        fn new(config: ServerConfig) -> Self {
            let network = MemoryNetwork::new();
            let pool = MessagePool::default();
            let transport = network.bind(SocketAddr::from(SERVER), pool.clone());
            let server =
                GameServer::new(transport, pool.clone(), KinematicMover::default(), config);
            Self {
                network,
                pool,
                server,
            }
        }

        fn peer(&self, port: u16) -> MemoryTransport {
            self.network
                .bind(SocketAddr::from(([10, 0, 0, 2], port)), self.pool.clone())
        }

        fn send(&self, peer: &mut MemoryTransport, message: ServerBound) {
            let packed = message.to_message(&self.pool).unwrap();
            peer.send(&packed, SocketAddr::from(SERVER)).unwrap();
        }
    }

    fn inbox(peer: &mut MemoryTransport) -> Vec<ClientBound> {
        let mut messages = Vec::new();
        while let Some(mut message) = peer.receive().unwrap() {
            messages.push(ClientBound::decode(message.buffer_mut()).unwrap());
        }
        messages
    }

    #[test]
    fn duplicate_join_does_not_create_record() {
        let mut harness = Harness::new(ServerConfig::default());
        let mut peer = harness.peer(1);
        harness.send(&mut peer, ServerBound::Join);
        harness.send(&mut peer, ServerBound::Join);
        harness.server.drain_incoming();

        assert_eq!(harness.server.clients().len(), 1);
        let replies = inbox(&mut peer);
        assert_eq!(replies.len(), 2);
        for reply in &replies {
            assert!(matches!(reply, ClientBound::JoinAccepted(a) if a.own.id == ClientId(0)));
        }
    }

    #[test]
    fn full_server_rejects_join() {
        let config = ServerConfig {
            max_clients: 1,
            ..Default::default()
        };
        let mut harness = Harness::new(config);
        let mut first = harness.peer(1);
        let mut second = harness.peer(2);
        harness.send(&mut first, ServerBound::Join);
        harness.send(&mut second, ServerBound::Join);
        harness.server.drain_incoming();

        assert_eq!(harness.server.clients().len(), 1);
        assert!(inbox(&mut second).is_empty());
        assert!(
            harness
                .server
                .drain_events()
                .any(|event| matches!(event, ServerEvent::JoinRejected { .. }))
        );
    }

    #[test]
    fn spoofed_input_is_dropped() {
        let mut harness = Harness::new(ServerConfig::default());
        let mut owner = harness.peer(1);
        let mut intruder = harness.peer(2);
        harness.send(&mut owner, ServerBound::Join);
        harness.server.drain_incoming();

        harness.send(
            &mut intruder,
            ServerBound::Input(InputBatch {
                sender: ClientId(0),
                commands: vec![LocomotionCommand::new(0, Buttons::FORWARD)],
            }),
        );
        harness.server.drain_incoming();
        harness.server.tick();

        let record = harness.server.client(ClientId(0)).unwrap();
        assert_eq!(record.inputs.last_processed(), None);
        assert_eq!(record.transform.position, Vec3::ZERO);
    }

    #[test]
    fn input_applies_then_snapshot_reports_ack() {
        let mut harness = Harness::new(ServerConfig::default());
        let mut peer = harness.peer(1);
        harness.send(&mut peer, ServerBound::Join);
        harness.server.drain_incoming();
        inbox(&mut peer);

        harness.send(
            &mut peer,
            ServerBound::Input(InputBatch {
                sender: ClientId(0),
                commands: vec![
                    LocomotionCommand::new(0, Buttons::FORWARD),
                    LocomotionCommand::new(1, Buttons::FORWARD),
                ],
            }),
        );
        harness.server.drain_incoming();
        harness.server.tick();

        let record = harness.server.client(ClientId(0)).unwrap();
        assert!(record.transform.position.z > 0.0);
        assert_eq!(record.inputs.last_processed(), Some(1));

        let snapshots: Vec<_> = inbox(&mut peer)
            .into_iter()
            .filter_map(|message| match message {
                ClientBound::Snapshot(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(
            snapshots[0].state(ClientId(0)).unwrap().last_input,
            Some(1)
        );
    }

    #[test]
    fn unknown_target_still_advances_mark() {
        let mut harness = Harness::new(ServerConfig::default());
        let mut peer = harness.peer(1);
        harness.send(&mut peer, ServerBound::Join);
        harness.server.drain_incoming();
        inbox(&mut peer);

        harness.send(
            &mut peer,
            ServerBound::Hit(HitReport {
                shooter: ClientId(0),
                shots: vec![ReportedShot {
                    id: 0,
                    target: ClientId(9),
                }],
            }),
        );
        harness.server.drain_incoming();

        assert_eq!(inbox(&mut peer), vec![ClientBound::HitAck(Some(0))]);
        assert_eq!(harness.server.client(ClientId(0)).unwrap().health, 100);
    }

    #[test]
    fn malformed_message_is_dropped_and_draining_continues() {
        let mut harness = Harness::new(ServerConfig::default());
        let mut peer = harness.peer(1);

        let mut garbage = harness.pool.obtain();
        garbage.buffer_mut().put_bits(7, 3).unwrap();
        garbage.buffer_mut().flush();
        peer.send(&garbage, SocketAddr::from(SERVER)).unwrap();
        harness.send(&mut peer, ServerBound::Join);

        assert_eq!(harness.server.drain_incoming(), 2);
        assert_eq!(harness.server.clients().len(), 1);
        assert!(
            harness
                .server
                .drain_events()
                .any(|event| matches!(event, ServerEvent::MessageDropped { .. }))
        );
    }

    #[test]
    fn bind_rejects_unsendable_client_limit() {
        let config = ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 0,
            max_clients: 10_000,
            ..ServerConfig::default()
        };
        let error = GameServer::bind(config).err().unwrap();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }
}
