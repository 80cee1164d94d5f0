//! Credential error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or reloading credential material.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The file could not be opened or read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate file holds no PEM certificate.
    #[error("no certificates found in {0:?}")]
    NoCertificates(PathBuf),

    /// The key file holds no PEM private key.
    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    /// rustls rejected the certificate/key pair.
    #[error("invalid certificate or key: {0}")]
    Tls(#[from] rustls::Error),
}

/// Errors raised by the credential watcher.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("file watch failed: {0}")]
    Notify(#[from] notify::Error),

    #[error("cannot watch {0:?}: path has no parent directory")]
    NoParent(PathBuf),
}
