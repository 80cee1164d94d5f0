//! Shutdown coordination for the supervisor.
//!
//! # Responsibilities
//! - Own the single loop that waits on every termination and reload trigger
//! - Run reloads inline, so they never overlap a shutdown
//! - Run the termination sequence exactly once, under a deadline

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialManager;
use crate::lifecycle::child::ProcessGroupSignaler;
use crate::lifecycle::closeable::{Closeable, Closeables, ReleaseReport};
use crate::lifecycle::deadline::{DeadlineEscalator, DeadlineHandle, Escalation, ForceExit};
use crate::lifecycle::events::{EventSource, LifecycleEvent, TriggerClass};
use crate::lifecycle::quit::QuitFlag;
use crate::lifecycle::reload::ReloadCoordinator;
use crate::observability::metrics;
use crate::status::{StatusEndpoint, StatusReporter};

/// Everything the coordinator needs, built once at startup.
pub struct ProcessContext {
    pub quit: QuitFlag,
    pub child: Option<Arc<dyn ProcessGroupSignaler>>,
    pub credentials: Arc<dyn CredentialManager>,
    pub status: StatusReporter,
    pub status_endpoint: Option<Arc<dyn StatusEndpoint>>,
    pub closeables: Closeables,
    pub shutdown_timeout: Duration,
    /// Action on deadline expiry; defaults to [`ForceExit`] against `child`.
    pub escalation: Option<Arc<dyn Escalation>>,
}

impl ProcessContext {
    pub fn new(credentials: Arc<dyn CredentialManager>, shutdown_timeout: Duration) -> Self {
        Self {
            quit: QuitFlag::new(),
            child: None,
            credentials,
            status: StatusReporter::new(),
            status_endpoint: None,
            closeables: Closeables::new(),
            shutdown_timeout,
            escalation: None,
        }
    }

    pub fn with_child(mut self, child: Arc<dyn ProcessGroupSignaler>) -> Self {
        self.child = Some(child);
        self
    }

    pub fn with_status_endpoint(mut self, endpoint: Arc<dyn StatusEndpoint>) -> Self {
        self.status_endpoint = Some(endpoint);
        self
    }

    pub fn with_escalation(mut self, escalation: Arc<dyn Escalation>) -> Self {
        self.escalation = Some(escalation);
        self
    }

    pub fn register(&mut self, resource: Arc<dyn Closeable>) {
        self.closeables.register(resource);
    }
}

/// How [`ShutdownCoordinator::run`] ended.
pub enum RunOutcome {
    /// A termination trigger was handled; the process is draining.
    Terminated {
        trigger: LifecycleEvent,
        deadline: DeadlineHandle,
        released: ReleaseReport,
    },
    /// The event source ended before any termination trigger.
    SourceClosed,
}

/// The authoritative lifecycle state machine.
pub struct ShutdownCoordinator {
    quit: QuitFlag,
    reload: ReloadCoordinator,
    escalator: DeadlineEscalator,
    shutdown_timeout: Duration,
    status_endpoint: Option<Arc<dyn StatusEndpoint>>,
    closeables: Closeables,
}

impl ShutdownCoordinator {
    pub fn new(context: ProcessContext) -> Self {
        let escalation = context
            .escalation
            .unwrap_or_else(|| Arc::new(ForceExit::new(context.child.clone())));

        Self {
            quit: context.quit,
            reload: ReloadCoordinator::new(context.credentials, context.status),
            escalator: DeadlineEscalator::new(escalation),
            shutdown_timeout: context.shutdown_timeout,
            status_endpoint: context.status_endpoint,
            closeables: context.closeables,
        }
    }

    /// Process events one at a time until the first termination trigger.
    ///
    /// Consumes the coordinator: the termination sequence cannot run twice, and
    /// anything arriving after it has begun is left unread.
    pub async fn run<E: EventSource>(self, events: &mut E) -> RunOutcome {
        while let Some(event) = events.next_event().await {
            metrics::record_trigger(event.as_str());

            match event.class() {
                TriggerClass::Reload => self.reload.handle(event),
                TriggerClass::Termination => return self.terminate(event).await,
            }
        }

        tracing::debug!("Lifecycle event source closed");
        RunOutcome::SourceClosed
    }

    async fn terminate(self, trigger: LifecycleEvent) -> RunOutcome {
        tracing::info!(signal = %trigger, "Received termination signal, shutting down");

        if let Some(endpoint) = &self.status_endpoint {
            spawn_detached("status endpoint shutdown", endpoint.shutdown());
        }

        let deadline = self.escalator.arm(self.shutdown_timeout);

        self.quit.set_quitting();
        metrics::record_quitting();

        let closeables = self.closeables;
        let count = closeables.len();
        let released = if closeables.is_empty() {
            ReleaseReport::default()
        } else {
            // Blocking pool: a close that hangs must not starve the deadline timer.
            match tokio::task::spawn_blocking(move || closeables.release_all()).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "Resource release task failed");
                    ReleaseReport {
                        released: 0,
                        failed: count,
                    }
                }
            }
        };

        tracing::info!(
            released = released.released,
            failed = released.failed,
            "Shutdown proxy, waiting for drain/child exit"
        );

        RunOutcome::Terminated {
            trigger,
            deadline,
            released,
        }
    }
}

/// Run `task` in the background. Errors are logged here and go nowhere else.
pub fn spawn_detached<F, E>(label: &'static str, task: F)
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            tracing::warn!(task = label, error = %e, "Background task failed");
        }
    });
}
