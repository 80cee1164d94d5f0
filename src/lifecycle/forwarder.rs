//! Relays termination signals to the child process group.

use std::sync::Arc;

use crate::lifecycle::child::ProcessGroupSignaler;
use crate::lifecycle::events::EventSource;
use crate::observability::metrics;

/// Forwards SIGINT/SIGTERM to the child's process group as they arrive.
///
/// Runs on its own subscription, independent of the shutdown coordinator, so
/// the child hears about termination immediately no matter how long the
/// coordinator's drain takes.
pub struct ChildSignalForwarder {
    child: Arc<dyn ProcessGroupSignaler>,
}

impl ChildSignalForwarder {
    pub fn new(child: Arc<dyn ProcessGroupSignaler>) -> Self {
        Self { child }
    }

    /// Spawn the forwarding loop when there is a child; `None` otherwise.
    pub fn spawn<E>(child: Option<Arc<dyn ProcessGroupSignaler>>, events: E) -> Option<tokio::task::JoinHandle<()>>
    where
        E: EventSource + 'static,
    {
        let child = child?;
        Some(tokio::spawn(Self::new(child).run(events)))
    }

    /// Forward until the event source is exhausted. OS sources never are.
    pub async fn run<E: EventSource>(self, mut events: E) {
        while let Some(event) = events.next_event().await {
            let Some(signal) = event.forwardable_signal() else {
                continue;
            };

            tracing::info!(signal = %signal, pgid = self.child.pgid(), "Sending signal to child process group");
            match self.child.signal_group(signal) {
                Ok(()) => metrics::record_forwarded_signal(event.as_str()),
                Err(e) => {
                    tracing::warn!(signal = %signal, pgid = self.child.pgid(), error = %e, "Failed to forward signal to child");
                }
            }
        }
        tracing::debug!("Child signal forwarder stopped");
    }
}
