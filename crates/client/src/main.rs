use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use volley_client::{ClientConfig, InputScript, NetworkClient};

const JOIN_RETRY: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "volley-client")]
#[command(about = "Headless volley client driven by an input script")]
struct Args {
    #[arg(short, long, help = "TOML file with client settings")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Server address to connect to (e.g., 127.0.0.1:27015)")]
    server: Option<String>,

    #[arg(short, long)]
    bind: Option<String>,

    #[arg(
        long,
        default_value = "idle",
        help = "Comma separated input steps, e.g. forward,forward+left,shoot"
    )]
    script: String,

    #[arg(short, long, help = "Stop after this many seconds")]
    duration: Option<f32>,
}

impl Args {
    fn config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config()?;
    let mut script = InputScript::parse(&args.script)?;
    let frame = Duration::from_secs_f32(1.0 / config.tick_rate.max(1) as f32);

    let mut client = NetworkClient::connect(config).context("connecting")?;
    info!("Client bound on {}", client.local_addr());

    let running = client.running();
    let started = Instant::now();
    let mut last_join = None;
    let mut last_update = Instant::now();
    while running.load(Ordering::SeqCst) {
        if let Some(limit) = args.duration {
            if started.elapsed().as_secs_f32() >= limit {
                break;
            }
        }

        if !client.is_joined() && last_join.is_none_or(|at: Instant| at.elapsed() >= JOIN_RETRY) {
            client.join()?;
            last_join = Some(Instant::now());
        }

        let now = Instant::now();
        let input = script.next_input();
        if let Err(e) = client.update((now - last_update).as_secs_f32(), input) {
            warn!("Update failed: {}", e);
        }
        last_update = now;

        std::thread::sleep(frame);
    }

    info!(
        "Finished with score {} and health {} ({} corrections)",
        client.score(),
        client.health(),
        client.prediction().corrections()
    );
    client.close();
    Ok(())
}
