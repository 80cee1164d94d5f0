//! Shutdown deadline and forced-exit escalation.
//!
//! # Responsibilities
//! - Bound the time spent draining once shutdown has begun
//! - On expiry, kill the child's process group and exit with status 1
//!
//! # Design Decisions
//! - The deadline is an explicit arm/fire/cancel handle so tests can expire it
//!   on demand instead of waiting for a real timeout
//! - Dropping the handle does not disarm the timer

use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::lifecycle::child::ProcessGroupSignaler;
use crate::observability::metrics;

/// Exit status used when the deadline forces the process down.
pub const FORCED_EXIT_CODE: i32 = 1;

/// The action taken when a deadline expires.
pub trait Escalation: Send + Sync {
    fn escalate(&self);
}

/// Default escalation: SIGKILL the child's process group, then exit.
pub struct ForceExit {
    child: Option<Arc<dyn ProcessGroupSignaler>>,
    exit: Box<dyn Fn(i32) + Send + Sync>,
}

impl ForceExit {
    pub fn new(child: Option<Arc<dyn ProcessGroupSignaler>>) -> Self {
        Self::with_exit(child, |code| std::process::exit(code))
    }

    /// Escalation with a custom exit hook instead of `std::process::exit`.
    pub fn with_exit<F>(child: Option<Arc<dyn ProcessGroupSignaler>>, exit: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        Self {
            child,
            exit: Box::new(exit),
        }
    }
}

impl Escalation for ForceExit {
    fn escalate(&self) {
        tracing::error!("Graceful shutdown timeout: forcing exit");
        metrics::record_forced_exit();

        if let Some(child) = &self.child {
            tracing::warn!(pgid = child.pgid(), "Sending SIGKILL to child process group");
            if let Err(e) = child.signal_group(Signal::SIGKILL) {
                tracing::error!(pgid = child.pgid(), error = %e, "Failed to kill child process group");
            }
        }

        (self.exit)(FORCED_EXIT_CODE);
    }
}

enum DeadlineCommand {
    Fire,
    Cancel,
}

/// Arms one-shot deadlines that run an [`Escalation`] on expiry.
#[derive(Clone)]
pub struct DeadlineEscalator {
    action: Arc<dyn Escalation>,
}

impl DeadlineEscalator {
    pub fn new(action: Arc<dyn Escalation>) -> Self {
        Self { action }
    }

    /// Schedule the escalation `timeout` from now. Must be called inside a Tokio runtime.
    pub fn arm(&self, timeout: Duration) -> DeadlineHandle {
        let (tx, rx) = oneshot::channel();
        let action = self.action.clone();

        tracing::info!(timeout = ?timeout, "Shutdown deadline armed");

        let task = tokio::spawn(async move {
            let sleep = tokio::time::sleep(timeout);
            tokio::pin!(sleep);

            tokio::select! {
                _ = &mut sleep => {}
                command = rx => match command {
                    Ok(DeadlineCommand::Fire) => {}
                    Ok(DeadlineCommand::Cancel) => {
                        tracing::debug!("Shutdown deadline cancelled");
                        return false;
                    }
                    // Handle dropped: keep the deadline running.
                    Err(_) => sleep.await,
                },
            }

            action.escalate();
            true
        });

        DeadlineHandle {
            commands: Some(tx),
            task,
        }
    }
}

/// An armed deadline.
pub struct DeadlineHandle {
    commands: Option<oneshot::Sender<DeadlineCommand>>,
    task: JoinHandle<bool>,
}

impl DeadlineHandle {
    /// Expire now, as if the timeout had elapsed.
    pub fn fire(&mut self) {
        self.send(DeadlineCommand::Fire);
    }

    /// Disarm without escalating. No effect once the deadline has expired.
    pub fn cancel(&mut self) {
        self.send(DeadlineCommand::Cancel);
    }

    /// Wait for the deadline to resolve; `true` if the escalation ran.
    pub async fn wait(self) -> bool {
        let DeadlineHandle { commands, task } = self;
        // Keep the command channel open while waiting so the timer is not
        // confused with a dropped handle.
        let result = task.await;
        drop(commands);
        result.unwrap_or(false)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn send(&mut self, command: DeadlineCommand) {
        if let Some(tx) = self.commands.take() {
            let _ = tx.send(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Escalation for Counter {
        fn escalate(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingGroup(Mutex<Vec<Signal>>);

    impl ProcessGroupSignaler for RecordingGroup {
        fn pgid(&self) -> i32 {
            4242
        }

        fn signal_group(&self, signal: Signal) -> nix::Result<()> {
            self.0.lock().unwrap().push(signal);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_timeout() {
        let counter = Arc::new(Counter::default());
        let handle = DeadlineEscalator::new(counter.clone()).arm(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        assert!(handle.wait().await);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms() {
        let counter = Arc::new(Counter::default());
        let mut handle = DeadlineEscalator::new(counter.clone()).arm(Duration::from_secs(5));

        handle.cancel();
        assert!(!handle.wait().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_fire_skips_the_wait() {
        let counter = Arc::new(Counter::default());
        let mut handle = DeadlineEscalator::new(counter.clone()).arm(Duration::from_secs(3600));

        handle.fire();
        assert!(handle.wait().await);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_still_fires() {
        let counter = Arc::new(Counter::default());
        drop(DeadlineEscalator::new(counter.clone()).arm(Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn force_exit_kills_group_then_exits_with_one() {
        let group = Arc::new(RecordingGroup::default());
        let exit_codes = Arc::new(Mutex::new(Vec::new()));
        let codes = exit_codes.clone();

        let escalation = ForceExit::with_exit(Some(group.clone()), move |code| {
            codes.lock().unwrap().push(code);
        });
        escalation.escalate();

        assert_eq!(*group.0.lock().unwrap(), vec![Signal::SIGKILL]);
        assert_eq!(*exit_codes.lock().unwrap(), vec![FORCED_EXIT_CODE]);
    }

    #[test]
    fn force_exit_without_child_only_exits() {
        let exit_codes = Arc::new(Mutex::new(Vec::new()));
        let codes = exit_codes.clone();

        ForceExit::with_exit(None, move |code| codes.lock().unwrap().push(code)).escalate();

        assert_eq!(*exit_codes.lock().unwrap(), vec![1]);
    }
}
