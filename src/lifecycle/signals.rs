//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGTERM, SIGCHLD, SIGUSR1)
//! - Translate signals and watcher notifications to [`LifecycleEvent`]s
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Every subscriber gets its own streams, so the coordinator and the child
//!   forwarder observe the same signal independently

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc;

use crate::lifecycle::events::{EventSource, LifecycleEvent};

/// The coordinator's multiplexed wait point: all four signals plus the
/// credential watcher's notification channel.
pub struct SignalEvents {
    interrupt: Signal,
    terminate: Signal,
    child: Signal,
    reload: Signal,
    watcher: Option<mpsc::UnboundedReceiver<()>>,
    pending: Option<LifecycleEvent>,
}

impl SignalEvents {
    /// Subscribe to the supervisor's signals.
    ///
    /// `watcher` is the credential notification channel; pass `None` when
    /// credentials are not watched.
    pub fn subscribe(watcher: Option<mpsc::UnboundedReceiver<()>>) -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            child: signal(SignalKind::child())?,
            reload: signal(SignalKind::user_defined1())?,
            watcher,
            pending: None,
        })
    }

    /// Attach the credential notification channel after subscribing.
    pub fn attach_watcher(&mut self, watcher: mpsc::UnboundedReceiver<()>) {
        self.watcher = Some(watcher);
    }

    /// Queue an event observed out of band; it is returned before any signal.
    pub fn push_pending(&mut self, event: LifecycleEvent) {
        self.pending = Some(event);
    }
}

impl EventSource for SignalEvents {
    async fn next_event(&mut self) -> Option<LifecycleEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        loop {
            tokio::select! {
                _ = self.interrupt.recv() => return Some(LifecycleEvent::Interrupt),
                _ = self.terminate.recv() => return Some(LifecycleEvent::Terminate),
                _ = self.child.recv() => return Some(LifecycleEvent::ChildChanged),
                _ = self.reload.recv() => return Some(LifecycleEvent::ReloadSignal),
                notified = next_notification(&mut self.watcher) => match notified {
                    Some(()) => return Some(LifecycleEvent::WatcherNotify),
                    None => {
                        tracing::debug!("Credential watcher channel closed");
                        self.watcher = None;
                    }
                },
            }
        }
    }
}

/// The forwarder's subscription: SIGINT and SIGTERM only.
pub struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl TerminationSignals {
    pub fn subscribe() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

impl EventSource for TerminationSignals {
    async fn next_event(&mut self) -> Option<LifecycleEvent> {
        tokio::select! {
            _ = self.interrupt.recv() => Some(LifecycleEvent::Interrupt),
            _ = self.terminate.recv() => Some(LifecycleEvent::Terminate),
        }
    }
}

/// Wait on an optional channel; pends forever when there is none.
async fn next_notification(rx: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn watcher_notifications_become_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut events = SignalEvents::subscribe(Some(rx)).unwrap();

        tx.send(()).unwrap();
        let event = tokio::time::timeout(Duration::from_secs(1), events.next_event())
            .await
            .expect("watcher notification not observed");
        assert_eq!(event, Some(LifecycleEvent::WatcherNotify));
    }

    #[tokio::test]
    async fn closed_watcher_does_not_spin() {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        drop(tx);
        let mut events = SignalEvents::subscribe(Some(rx)).unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(100), events.next_event()).await;
        assert!(waited.is_err(), "no event expected once the watcher is gone");
        assert!(events.watcher.is_none());
    }

    #[tokio::test]
    async fn pending_event_comes_first() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut events = SignalEvents::subscribe(None).unwrap();
        events.attach_watcher(rx);
        events.push_pending(LifecycleEvent::ChildChanged);
        tx.send(()).unwrap();

        assert_eq!(events.next_event().await, Some(LifecycleEvent::ChildChanged));
        assert_eq!(events.next_event().await, Some(LifecycleEvent::WatcherNotify));
    }
}
