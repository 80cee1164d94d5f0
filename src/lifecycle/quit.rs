//! Process-wide quit flag.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const RUNNING: u32 = 0;
const QUITTING: u32 = 1;

/// Flag telling the data plane to stop admitting new work.
///
/// Written once (running → quitting) by the shutdown coordinator and never
/// reset. Cheap to clone; all clones share the same atomic.
#[derive(Debug, Clone, Default)]
pub struct QuitFlag {
    state: Arc<AtomicU32>,
}

impl QuitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to quitting. Returns `true` only for the call that flipped the flag.
    pub fn set_quitting(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, QUITTING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_quitting(&self) -> bool {
        self.state.load(Ordering::SeqCst) == QUITTING
    }
}
