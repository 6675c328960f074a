use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use volley::{
    Buttons, ClientBound, ClientId, ClientState, CodecError, FixedTimestep, HitTest, InputBatch,
    KinematicMover, Locomotion, MessagePool, NetworkStats, PooledMessage, RayHitTest,
    ServerBound, ShotLedger, SnapshotSender, Transform, Transport, TransportError, UdpTransport,
};

use super::config::ClientConfig;
use super::input::InputState;
use super::interpolation::RemoteEntities;
use super::prediction::ClientPrediction;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to encode message: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Joining,
    Joined,
}

pub struct NetworkClient<T: Transport, L: Locomotion = KinematicMover, H: HitTest = RayHitTest> {
    transport: T,
    pool: MessagePool,
    server_addr: SocketAddr,
    locomotion: L,
    hit_test: H,
    config: ClientConfig,
    state: ConnectionState,
    client_id: Option<ClientId>,
    health: i32,
    prediction: ClientPrediction,
    remotes: RemoteEntities,
    snapshots: SnapshotSender,
    shots: ShotLedger,
    hit_report_timer: f32,
    timestep: FixedTimestep,
    running: Arc<AtomicBool>,
}

impl NetworkClient<UdpTransport, KinematicMover, RayHitTest> {
    pub fn connect(config: ClientConfig) -> io::Result<Self> {
        let server_addr: SocketAddr = config.server.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid server address '{}': {}", config.server, e),
            )
        })?;
        let pool = MessagePool::default();
        let transport = UdpTransport::bind(config.bind.as_str(), pool.clone())?;
        let locomotion = KinematicMover::new(config.movement);
        let hit_test = config.hit_test;
        Ok(Self::new(transport, pool, server_addr, locomotion, hit_test, config))
    }
}

impl<T: Transport, L: Locomotion, H: HitTest> NetworkClient<T, L, H> {
    pub fn new(
        transport: T,
        pool: MessagePool,
        server_addr: SocketAddr,
        locomotion: L,
        hit_test: H,
        config: ClientConfig,
    ) -> Self {
        let (snapshots, remotes) = RemoteEntities::new(&config.interpolation);
        Self {
            transport,
            pool,
            server_addr,
            locomotion,
            hit_test,
            state: ConnectionState::Disconnected,
            client_id: None,
            health: 0,
            prediction: ClientPrediction::default(),
            remotes,
            snapshots,
            shots: ShotLedger::new(config.shot_ttl),
            hit_report_timer: 0.0,
            timestep: FixedTimestep::new(config.tick_rate),
            running: Arc::new(AtomicBool::new(true)),
            config,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == ConnectionState::Joined
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn score(&self) -> u32 {
        self.shots.score()
    }

    pub fn transform(&self) -> Transform {
        self.prediction.transform()
    }

    pub fn prediction(&self) -> &ClientPrediction {
        &self.prediction
    }

    pub fn remotes(&self) -> &RemoteEntities {
        &self.remotes
    }

    pub fn shots(&self) -> &ShotLedger {
        &self.shots
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

    pub fn join(&mut self) -> Result<(), ClientError> {
        info!("Joining {}", self.server_addr);
        self.send(&ServerBound::Join)?;
        if self.state == ConnectionState::Disconnected {
            self.state = ConnectionState::Joining;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.transport.close();
        self.state = ConnectionState::Disconnected;
    }

    /// Drains the transport, then runs every fixed tick the elapsed time allows.
    /// A failed send does not stop later ticks; the first failure is returned.
    pub fn update(&mut self, delta: f32, input: InputState) -> Result<u32, ClientError> {
        self.drain_incoming()?;
        self.timestep.accumulate(delta);

        let mut ticks_run = 0;
        let mut outcome = Ok(());
        while self.timestep.consume_tick() {
            let result = self.tick(input);
            if outcome.is_ok() {
                outcome = result;
            }
            ticks_run += 1;
        }
        outcome.map(|()| ticks_run)
    }

    pub fn drain_incoming(&mut self) -> Result<usize, ClientError> {
        let mut handled = 0;
        while let Some(message) = self.transport.receive()? {
            self.handle_message(message);
            handled += 1;
        }
        Ok(handled)
    }

    /// Runs every step of one tick even when a send fails; the first send error is returned.
    pub fn tick(&mut self, input: InputState) -> Result<(), ClientError> {
        let Some(id) = self.client_id else {
            return Ok(());
        };
        let dt = self.timestep.dt();
        let buttons = input.to_buttons();

        if let Some(snapshot) = self.remotes.advance(dt) {
            if let Some(own) = snapshot.state(id) {
                self.health = own.health;
                self.prediction.reconcile(&self.locomotion, own, dt);
            }
        }

        self.prediction.predict(&self.locomotion, buttons, dt);
        let limit = InputBatch::max_commands(self.pool.message_capacity());
        let batch = ServerBound::Input(InputBatch {
            sender: id,
            commands: self.prediction.batch(limit),
        });
        let mut outcome = self.send(&batch);

        if buttons.contains(Buttons::SHOOT) {
            let targets = self.remotes.targets();
            if let Some(target) = self.hit_test.cast(&self.prediction.transform(), &targets) {
                let shot = self.shots.record(id, target);
                debug!("Shot {} hit {}", shot, target);
            }
        }

        self.shots.expire(dt);
        self.hit_report_timer += dt;
        if self.hit_report_timer >= self.config.hit_report_interval {
            self.hit_report_timer = 0.0;
            if let Some(report) = self.shots.report(id) {
                outcome = outcome.and(self.send(&ServerBound::Hit(report)));
            }
        }

        if let Err(e) = &outcome {
            warn!("Tick {} send failed: {}", self.timestep.ticks(), e);
        }
        outcome
    }

    fn handle_message(&mut self, mut message: PooledMessage) {
        if message.sender() != Some(self.server_addr) {
            debug!("Ignoring datagram from {:?}", message.sender());
            return;
        }
        let decoded = ClientBound::decode(message.buffer_mut());
        message.free();

        match decoded {
            Ok(ClientBound::JoinAccepted(accepted)) => {
                self.accept_join(&accepted.own);
                for other in &accepted.others {
                    self.remotes.track(other);
                }
            }
            Ok(ClientBound::JoinBroadcast(state)) => {
                if Some(state.id) != self.client_id {
                    info!("{} joined", state.id);
                    self.remotes.track(&state);
                }
            }
            Ok(ClientBound::Snapshot(snapshot)) => {
                self.snapshots.send(snapshot);
            }
            Ok(ClientBound::HitAck(mark)) => {
                let credited = self.shots.acknowledge(mark);
                if credited > 0 {
                    debug!("Credited {} points, score {}", credited, self.shots.score());
                }
            }
            Err(e) => warn!("Dropping message from server: {}", e),
        }
    }

    fn accept_join(&mut self, own: &ClientState) {
        if self.client_id == Some(own.id) {
            return;
        }
        info!("Joined as {}", own.id);
        self.client_id = Some(own.id);
        self.health = own.health;
        self.prediction = ClientPrediction::new(own.transform);
        self.remotes.set_local(own.id);
        self.state = ConnectionState::Joined;
    }

    fn send(&mut self, message: &ServerBound) -> Result<(), ClientError> {
        let packed = message.to_message(&self.pool)?;
        self.transport.send(&packed, self.server_addr)?;
        Ok(())
    }
}
