//! `vitalink` command-line agent.
//!
//! Runs the telemetry agent on a host with simulated sensors, posting records
//! to the configured collector until interrupted.
//!
//! ```bash
//! vitalink --config vitalink.yaml
//! vitalink --collector-url http://127.0.0.1:8080/api/telemetry --concurrent
//! RUST_LOG=vitalink=debug vitalink --heart-rate 95
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitalink::sim::{SimulatedPpg, SimulatedThermometer};
use vitalink::{Agent, AgentConfig, AlwaysOnline, HttpTransport, Peripherals, SchedulingMode};

#[derive(Parser, Debug)]
#[command(name = "vitalink")]
#[command(about = "Vital-sign telemetry agent", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collector endpoint, overrides the configuration file
    #[arg(long)]
    collector_url: Option<String>,

    /// Device identifier, overrides the configuration file
    #[arg(long)]
    device_id: Option<u32>,

    /// Run acquisition and transmission as separate tasks
    #[arg(long)]
    concurrent: bool,

    /// Simulated heart rate in beats per minute
    #[arg(long, default_value_t = 72.0)]
    heart_rate: f32,
}

impl Cli {
    fn agent_config(&self) -> Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => AgentConfig::default(),
        };

        if let Some(url) = &self.collector_url {
            config.collector_url = url.clone();
        }
        if let Some(device_id) = self.device_id {
            config.device_id = device_id;
        }
        if self.concurrent {
            config.scheduler.mode = SchedulingMode::Concurrent;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.agent_config()?;
    let agent = Agent::new(config.clone())?;
    if !config.network.candidates.is_empty() {
        warn!(
            candidates = config.network.candidates.len(),
            "Host network is managed by the OS, ignoring network.candidates"
        );
    }

    let peripherals = Peripherals {
        waveform: SimulatedPpg::default()
            .with_sample_rate(config.estimator.sample_rate_hz)
            .with_heart_rate(cli.heart_rate),
        temperature: SimulatedThermometer::default(),
        estimator: agent.default_estimator(),
        transport: HttpTransport::new(&config.collector_url)?,
        link: AlwaysOnline,
    };

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => warn!("Ctrl-C handler unavailable, running until killed: {}", e),
        }
    });

    agent.run(peripherals, cancel).await;
    Ok(())
}
