//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the supervisor.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Certificate and key served by the proxy.
    pub tls: TlsConfig,

    /// Status endpoint settings.
    pub status: StatusConfig,

    /// Shutdown and reload behaviour.
    pub lifecycle: LifecycleConfig,

    /// Optional supervised child process.
    pub child: Option<ChildConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// TLS credential locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("server.crt"),
            key_path: PathBuf::from("server.key"),
        }
    }
}

/// Status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Enable the status endpoint.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:6060").
    pub bind_address: String,

    /// Serve over HTTPS with the proxy's (reloadable) certificate.
    pub use_tls: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:6060".to_string(),
            use_tls: false,
        }
    }
}

/// Shutdown and reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time allowed for draining before the process is forced down, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Reload credentials when the files change on disk.
    pub watch_credentials: bool,

    /// Reload credentials on a fixed interval, in seconds (0 = disabled).
    pub reload_interval_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 300,
            watch_credentials: true,
            reload_interval_secs: 0,
        }
    }
}

impl LifecycleConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

/// Child process to launch and supervise.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChildConfig {
    /// Executable to run.
    pub command: String,

    /// Arguments passed to the command.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
