//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle components produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every trigger and phase transition is logged
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
