//! Credential management subsystem.
//!
//! # Data Flow
//! ```text
//! cert/key files on disk
//!     → watcher.rs (notify events, optional reload timer)
//!     → notification channel → ShutdownCoordinator
//!     → ReloadCoordinator → store.rs reload()
//!     → rustls ServerConfig rebuilt
//!     → atomic swap (RustlsConfig + ArcSwap snapshot)
//! ```
//!
//! # Design Decisions
//! - A failed reload never replaces working credentials
//! - Notifications are payload-free; duplicates just cause another reload

pub mod error;
pub mod store;
pub mod watcher;

pub use error::{CredentialError, WatcherError};
pub use store::{CertificateStore, CredentialManager, LoadedCredentials};
pub use watcher::CredentialWatcher;
