//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load credentials → Launch child → Start watcher → Start status endpoint
//!
//! Events (events.rs, signals.rs):
//!     SIGINT/SIGTERM/SIGCHLD → termination trigger
//!     SIGUSR1, watcher notification → reload trigger
//!
//! Shutdown (shutdown.rs):
//!     Termination trigger → status endpoint shutdown (detached)
//!                         → arm deadline (deadline.rs)
//!                         → set quit flag (quit.rs)
//!                         → release closeables (closeable.rs)
//!     Reload trigger      → reload.rs, then keep waiting
//!
//! Forwarding (forwarder.rs), in parallel:
//!     SIGINT/SIGTERM → same signal to the child process group (child.rs)
//! ```
//!
//! # Design Decisions
//! - One sequential loop handles both reload and termination, so they never overlap
//! - Shutdown has a deadline: forced exit (and SIGKILL to the child) after it
//! - The forwarder has its own signal subscription and never waits on the drain

pub mod child;
pub mod closeable;
pub mod deadline;
pub mod events;
pub mod forwarder;
pub mod quit;
pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use child::{ChildProcess, ProcessGroupSignaler};
pub use closeable::{Closeable, Closeables, ReleaseReport};
pub use deadline::{DeadlineEscalator, DeadlineHandle, Escalation, ForceExit};
pub use events::{ChannelEvents, EventSource, LifecycleEvent, TriggerClass};
pub use forwarder::ChildSignalForwarder;
pub use quit::QuitFlag;
pub use reload::ReloadCoordinator;
pub use shutdown::{ProcessContext, RunOutcome, ShutdownCoordinator};
pub use signals::{SignalEvents, TerminationSignals};
