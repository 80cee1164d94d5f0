//! Lifecycle events and the sources that produce them.
//!
//! The coordinator and the forwarder never touch OS signals directly. They
//! consume [`LifecycleEvent`]s from an [`EventSource`], so the same state
//! machine runs against real signals ([`crate::lifecycle::signals`]) or an
//! in-process channel ([`ChannelEvents`]).

use std::fmt;
use std::future::Future;

use nix::sys::signal::Signal;
use tokio::sync::mpsc;

/// A discrete trigger observed by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGCHLD: the child exited, stopped or continued.
    ChildChanged,
    /// SIGUSR1.
    ReloadSignal,
    /// The credential watcher saw a change on disk (or the reload timer ticked).
    WatcherNotify,
}

/// Which handling path an event takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerClass {
    Termination,
    Reload,
}

impl LifecycleEvent {
    pub fn class(&self) -> TriggerClass {
        match self {
            LifecycleEvent::Interrupt
            | LifecycleEvent::Terminate
            | LifecycleEvent::ChildChanged => TriggerClass::Termination,
            LifecycleEvent::ReloadSignal | LifecycleEvent::WatcherNotify => TriggerClass::Reload,
        }
    }

    /// The POSIX signal behind this event, if it came from one.
    pub fn signal(&self) -> Option<Signal> {
        match self {
            LifecycleEvent::Interrupt => Some(Signal::SIGINT),
            LifecycleEvent::Terminate => Some(Signal::SIGTERM),
            LifecycleEvent::ChildChanged => Some(Signal::SIGCHLD),
            LifecycleEvent::ReloadSignal => Some(Signal::SIGUSR1),
            LifecycleEvent::WatcherNotify => None,
        }
    }

    /// The signal to relay to the child process group, for the events that are relayed.
    pub fn forwardable_signal(&self) -> Option<Signal> {
        match self {
            LifecycleEvent::Interrupt | LifecycleEvent::Terminate => self.signal(),
            _ => None,
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Interrupt => "SIGINT",
            LifecycleEvent::Terminate => "SIGTERM",
            LifecycleEvent::ChildChanged => "SIGCHLD",
            LifecycleEvent::ReloadSignal => "SIGUSR1",
            LifecycleEvent::WatcherNotify => "watcher",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A multiplexed wait point yielding one event at a time.
///
/// `None` means the source is exhausted and will never yield again. OS-backed
/// sources never return `None`.
pub trait EventSource: Send {
    fn next_event(&mut self) -> impl Future<Output = Option<LifecycleEvent>> + Send;
}

/// In-process event source backed by an mpsc channel.
///
/// Lets an embedding application (or a test) drive the coordinator without
/// raising real signals.
#[derive(Debug)]
pub struct ChannelEvents {
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl ChannelEvents {
    /// Create a source and the sender that feeds it.
    pub fn channel() -> (mpsc::UnboundedSender<LifecycleEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl EventSource for ChannelEvents {
    async fn next_event(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }
}
