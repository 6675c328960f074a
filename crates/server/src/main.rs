use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use volley_server::{GameServer, ServerConfig, ServerEvent};

#[derive(Parser)]
#[command(name = "volley-server")]
#[command(about = "Authoritative volley simulation server")]
struct Args {
    #[arg(short, long, help = "TOML file with server settings")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    bind: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    tick_rate: Option<u32>,

    #[arg(short, long)]
    snapshot_rate: Option<u32>,

    #[arg(short, long)]
    max_clients: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        if let Some(snapshot_rate) = self.snapshot_rate {
            config.snapshot_rate = snapshot_rate;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    let bind_addr = config.bind_addr();
    let mut server =
        GameServer::bind(config).with_context(|| format!("binding {}", bind_addr))?;
    info!("Server started on {}", server.local_addr());

    let running = server.running();
    let mut last_update = Instant::now();
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        server.update((now - last_update).as_secs_f32());
        last_update = now;

        for event in server.drain_events() {
            match event {
                ServerEvent::ClientJoined { client_id, addr } => {
                    info!("{} connected from {}", client_id, addr);
                }
                ServerEvent::JoinRejected { addr, reason } => {
                    warn!("Join from {} rejected: {}", addr, reason);
                }
                ServerEvent::ClientEliminated { client_id, by } => {
                    info!("{} was eliminated by {}", client_id, by);
                }
                ServerEvent::MessageDropped { .. } => {}
                ServerEvent::Error { message } => error!("{}", message),
            }
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    info!("Server shutting down");
    Ok(())
}
