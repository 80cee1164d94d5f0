//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides applied in main
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig (validated, immutable)
//!     → startup.rs builds the lifecycle from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only credentials hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ChildConfig, LifecycleConfig, StatusConfig, SupervisorConfig, TlsConfig};
pub use validation::ValidationError;
