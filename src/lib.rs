//! Process-lifecycle control for a TLS-terminating proxy.
//!
//! Coordinates graceful shutdown, forced termination and credential
//! hot-reload for the proxy and its optional child worker.

pub mod config;
pub mod credentials;
pub mod lifecycle;
pub mod observability;
pub mod status;

pub use config::schema::SupervisorConfig;
pub use lifecycle::startup::Supervisor;
pub use lifecycle::{ProcessContext, ShutdownCoordinator};
