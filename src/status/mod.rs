//! Status reporting subsystem.
//!
//! # Data Flow
//! ```text
//! ReloadCoordinator ── set_reloading / set_listening ──▶ reporter.rs (atomics)
//!                                                             │
//! QuitFlag ───────────────────────────────────────────────────┤
//!                                                             ▼
//!                                               server.rs  GET /_status
//! ```
//!
//! # Design Decisions
//! - Reads never block the coordinator: status is a pair of atomics
//! - The endpoint turns 503 once the quit flag is set so load balancers drain us

pub mod reporter;
pub mod server;

pub use reporter::{ReloadStatus, StatusReporter};
pub use server::{StatusEndpoint, StatusError, StatusServer};
