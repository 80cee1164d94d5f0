//! Child process group signaling.
//!
//! The supervisor never spawns, restarts or reaps through this handle. It only
//! targets signals at the child's process group so descendants are reached too.

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;

/// Sends signals to a process group.
pub trait ProcessGroupSignaler: Send + Sync {
    /// Process group id targeted by [`signal_group`](Self::signal_group).
    fn pgid(&self) -> i32;

    fn signal_group(&self, signal: Signal) -> nix::Result<()>;
}

/// Handle to a child that leads its own process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildProcess {
    pgid: Pid,
}

impl ChildProcess {
    /// Handle for a child spawned as the leader of a new process group
    /// (`process_group(0)`), where the group id equals its pid.
    pub fn from_pid(pid: u32) -> Self {
        Self {
            pgid: Pid::from_raw(pid as i32),
        }
    }
}

impl ProcessGroupSignaler for ChildProcess {
    fn pgid(&self) -> i32 {
        self.pgid.as_raw()
    }

    fn signal_group(&self, signal: Signal) -> nix::Result<()> {
        killpg(self.pgid, signal)
    }
}
