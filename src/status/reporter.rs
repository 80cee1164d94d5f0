//! Reload status shared with the status endpoint.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Whether credentials are currently being reloaded.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadStatus {
    Listening = 0,
    Reloading = 1,
}

impl From<u8> for ReloadStatus {
    fn from(val: u8) -> Self {
        match val {
            1 => ReloadStatus::Reloading,
            _ => ReloadStatus::Listening,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    status: AtomicU8,
    reloads: AtomicU64,
}

/// Lock-free status setter/getter; clones share state.
#[derive(Debug, Clone, Default)]
pub struct StatusReporter {
    inner: Arc<Inner>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reloading(&self) {
        self.inner
            .status
            .store(ReloadStatus::Reloading as u8, Ordering::SeqCst);
    }

    /// Back to listening; counts one completed reload attempt.
    pub fn set_listening(&self) {
        let previous = self
            .inner
            .status
            .swap(ReloadStatus::Listening as u8, Ordering::SeqCst);
        if ReloadStatus::from(previous) == ReloadStatus::Reloading {
            self.inner.reloads.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn status(&self) -> ReloadStatus {
        ReloadStatus::from(self.inner.status.load(Ordering::SeqCst))
    }

    /// Number of reload attempts completed (successful or not).
    pub fn reloads(&self) -> u64 {
        self.inner.reloads.load(Ordering::Relaxed)
    }
}
