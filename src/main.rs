//! TLS tunnel supervisor.
//!
//! Supervises an optional child worker and coordinates graceful shutdown,
//! forced termination and certificate hot-reload.
//!
//! # Architecture Overview
//!
//! ```text
//!   SIGINT/SIGTERM/SIGCHLD ──┐
//!   SIGUSR1 ─────────────────┤       ┌──────────────────────┐
//!   credential watcher ──────┼──────▶│ ShutdownCoordinator  │──▶ ReloadCoordinator ──▶ CertificateStore
//!                            │       │  (sequential loop)   │
//!                            │       └──────────┬───────────┘
//!                            │                  │ termination
//!                            │                  ├──▶ status endpoint shutdown (detached)
//!                            │                  ├──▶ DeadlineEscalator ──▶ SIGKILL child group, exit 1
//!                            │                  ├──▶ QuitFlag
//!                            │                  └──▶ release closeables
//!                            │
//!                            └──────▶ ChildSignalForwarder ──▶ child process group
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use tunnel_supervisor::config::validation::validate_config;
use tunnel_supervisor::config::{load_config, ChildConfig, ConfigError, SupervisorConfig};
use tunnel_supervisor::lifecycle::startup::Supervisor;
use tunnel_supervisor::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "tunnel-supervisor")]
#[command(about = "Lifecycle supervisor for a TLS-terminating proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "supervisor.toml")]
    config: PathBuf,

    /// Override lifecycle.shutdown_timeout_secs.
    #[arg(long, value_name = "SECS")]
    shutdown_timeout: Option<u64>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,

    /// Child command and arguments, overriding [child] from the config file.
    #[arg(last = true)]
    child: Vec<String>,
}

impl Cli {
    fn apply(&self, config: &mut SupervisorConfig) {
        if let Some(secs) = self.shutdown_timeout {
            config.lifecycle.shutdown_timeout_secs = secs;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some((command, args)) = self.child.split_first() {
            config.child = Some(ChildConfig {
                command: command.clone(),
                args: args.to_vec(),
            });
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        config = ?cli.config,
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        "tunnel-supervisor v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let supervisor = Supervisor::start(&config)?;
    supervisor.run().await?;

    Ok(())
}
