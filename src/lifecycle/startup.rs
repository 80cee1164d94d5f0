//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Launch the child in its own process group
//! - Wire everything into a [`ProcessContext`] and run the coordinator
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Signal subscriptions exist before the child is launched, so neither its
//!   exit nor an early SIGTERM can slip past the coordinator
//! - Credentials load next; the status endpoint starts last

use std::net::SocketAddr;
use std::process::ExitStatus;
use std::sync::Arc;

use thiserror::Error;
use tokio::process::{Child, Command};

use crate::config::{ChildConfig, SupervisorConfig};
use crate::credentials::{CertificateStore, CredentialError, CredentialWatcher, WatcherError};
use crate::lifecycle::child::{ChildProcess, ProcessGroupSignaler};
use crate::lifecycle::events::LifecycleEvent;
use crate::lifecycle::forwarder::ChildSignalForwarder;
use crate::lifecycle::shutdown::{ProcessContext, RunOutcome, ShutdownCoordinator};
use crate::lifecycle::signals::{SignalEvents, TerminationSignals};
use crate::status::{StatusError, StatusServer};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load credentials: {0}")]
    Credentials(#[from] CredentialError),

    #[error("failed to watch credentials: {0}")]
    Watcher(#[from] WatcherError),

    #[error("failed to start status endpoint: {0}")]
    Status(#[from] StatusError),

    #[error("invalid address {0:?}")]
    Address(String),

    #[error("failed to launch child {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to subscribe to signals: {0}")]
    Signals(std::io::Error),
}

/// A fully started supervisor, ready to run its lifecycle.
pub struct Supervisor {
    context: ProcessContext,
    store: Arc<CertificateStore>,
    child: Option<Child>,
    events: SignalEvents,
    forwarder_signals: Option<TerminationSignals>,
}

impl Supervisor {
    /// Start every subsystem described by `config`. Must be called inside a Tokio runtime.
    pub fn start(config: &SupervisorConfig) -> Result<Self, StartupError> {
        let mut events = SignalEvents::subscribe(None).map_err(StartupError::Signals)?;
        let forwarder_signals = match &config.child {
            Some(_) => Some(TerminationSignals::subscribe().map_err(StartupError::Signals)?),
            None => None,
        };

        let store = Arc::new(CertificateStore::load(
            &config.tls.cert_path,
            &config.tls.key_path,
        )?);

        let mut context = ProcessContext::new(store.clone(), config.lifecycle.shutdown_timeout());

        let child = match &config.child {
            Some(child_config) => {
                let child = spawn_child(child_config)?;
                if let Some(pid) = child.id() {
                    context = context.with_child(Arc::new(ChildProcess::from_pid(pid)));
                }
                Some(child)
            }
            None => None,
        };

        if config.lifecycle.watch_credentials || config.lifecycle.reload_interval().is_some() {
            let (watcher, rx) = CredentialWatcher::new(&[store.cert_path(), store.key_path()]);
            if config.lifecycle.watch_credentials {
                watcher.start()?;
            }
            if let Some(interval) = config.lifecycle.reload_interval() {
                watcher.start_timed_reload(interval);
            }
            context.register(Arc::new(watcher));
            events.attach_watcher(rx);
        }

        if config.status.enabled {
            let addr: SocketAddr = config
                .status
                .bind_address
                .parse()
                .map_err(|_| StartupError::Address(config.status.bind_address.clone()))?;
            let tls = config.status.use_tls.then(|| store.rustls_config());
            let server = StatusServer::start(addr, tls, context.status.clone(), context.quit.clone())?;
            context = context.with_status_endpoint(Arc::new(server));
        }

        tracing::info!(
            child = context.child.as_ref().map(|c| c.pgid()),
            closeables = context.closeables.len(),
            shutdown_timeout = ?context.shutdown_timeout,
            "Supervisor started"
        );

        Ok(Self {
            context,
            store,
            child,
            events,
            forwarder_signals,
        })
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ProcessContext {
        &mut self.context
    }

    pub fn credentials(&self) -> &Arc<CertificateStore> {
        &self.store
    }

    /// Run until shutdown: forward signals to the child, drive the coordinator,
    /// then wait for the child to exit. The armed deadline bounds that wait.
    pub async fn run(self) -> Result<(), StartupError> {
        let Supervisor {
            context,
            mut child,
            mut events,
            forwarder_signals,
            ..
        } = self;

        // A child that already died during startup terminates immediately.
        if let Some(child) = child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    log_child_exit(status);
                    events.push_pending(LifecycleEvent::ChildChanged);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to poll child status"),
            }
        }

        let forwarder = forwarder_signals.and_then(|signals| ChildSignalForwarder::spawn(context.child.clone(), signals));

        // The deadline handle is dropped with the outcome; it stays armed.
        if let RunOutcome::SourceClosed = ShutdownCoordinator::new(context).run(&mut events).await {
            tracing::warn!("Signal source closed unexpectedly");
        }

        if let Some(mut child) = child {
            match child.wait().await {
                Ok(status) => log_child_exit(status),
                Err(e) => tracing::error!(error = %e, "Failed to wait for child"),
            }
        }

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }

        tracing::info!("Shutdown complete");
        Ok(())
    }
}

/// Launch the child as the leader of a new process group.
///
/// The child is killed if its handle is dropped before being waited on, so a
/// failed startup does not leave it behind.
pub fn spawn_child(config: &ChildConfig) -> Result<Child, StartupError> {
    let child = Command::new(&config.command)
        .args(&config.args)
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| StartupError::Spawn {
            command: config.command.clone(),
            source,
        })?;

    tracing::info!(command = %config.command, pid = child.id(), "Child process launched");
    Ok(child)
}

fn log_child_exit(status: ExitStatus) {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => tracing::info!(code, "Child exited"),
        (None, Some(signal)) => tracing::info!(signal, "Child terminated by signal"),
        _ => tracing::info!("Child exited"),
    }
}
