//! TLS certificate loading and hot reload.
//!
//! # Responsibilities
//! - Load a PEM certificate chain and private key from disk
//! - Publish them to the TLS acceptor through a shared [`RustlsConfig`]
//! - Swap in new material atomically on reload, keeping the old on failure

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwap;
use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;

use crate::credentials::error::CredentialError;

/// Something that can re-read and atomically swap credential material.
pub trait CredentialManager: Send + Sync {
    /// Re-read credentials. On error the previously loaded material stays active.
    fn reload(&self) -> Result<(), CredentialError>;
}

/// Snapshot of the credential material currently being served.
#[derive(Debug)]
pub struct LoadedCredentials {
    /// Incremented on every successful load, starting at 1.
    pub generation: u64,
    /// Number of certificates in the chain.
    pub chain_len: usize,
    pub loaded_at: SystemTime,
    pub server_config: Arc<ServerConfig>,
}

/// Certificate/key pair on disk, served through a reloadable [`RustlsConfig`].
pub struct CertificateStore {
    cert_path: PathBuf,
    key_path: PathBuf,
    tls: RustlsConfig,
    active: ArcSwap<LoadedCredentials>,
}

impl CertificateStore {
    /// Load the initial material. Fails if either file is missing or invalid.
    pub fn load(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let cert_path = cert_path.into();
        let key_path = key_path.into();

        let (server_config, chain_len) = build_server_config(&cert_path, &key_path)?;
        let tls = RustlsConfig::from_config(server_config.clone());

        tracing::info!(
            cert = ?cert_path,
            key = ?key_path,
            chain_len,
            "Loaded TLS credentials"
        );

        Ok(Self {
            cert_path,
            key_path,
            tls,
            active: ArcSwap::from_pointee(LoadedCredentials {
                generation: 1,
                chain_len,
                loaded_at: SystemTime::now(),
                server_config,
            }),
        })
    }

    /// Handle for TLS listeners; it follows every successful reload.
    pub fn rustls_config(&self) -> RustlsConfig {
        self.tls.clone()
    }

    pub fn active(&self) -> Arc<LoadedCredentials> {
        self.active.load_full()
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

impl CredentialManager for CertificateStore {
    fn reload(&self) -> Result<(), CredentialError> {
        let (server_config, chain_len) = build_server_config(&self.cert_path, &self.key_path)?;
        let previous = self.active.load_full();
        let generation = previous.generation + 1;

        self.tls.reload_from_config(server_config.clone());
        self.active.store(Arc::new(LoadedCredentials {
            generation,
            chain_len,
            loaded_at: SystemTime::now(),
            server_config,
        }));

        tracing::info!(
            generation,
            chain_len,
            replaced_age = ?previous.loaded_at.elapsed().unwrap_or_default(),
            "TLS credentials swapped"
        );
        Ok(())
    }
}

fn build_server_config(cert_path: &Path, key_path: &Path) -> Result<(Arc<ServerConfig>, usize), CredentialError> {
    let certs = read_certs(cert_path)?;
    let key = read_key(key_path)?;
    let chain_len = certs.len();

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok((Arc::new(config), chain_len))
}

fn open(path: &Path) -> Result<BufReader<File>, CredentialError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, CredentialError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(CredentialError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, CredentialError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| CredentialError::NoPrivateKey(path.to_path_buf()))
}
