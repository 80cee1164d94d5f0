//! Resources released during drain.
//!
//! # Responsibilities
//! - Hold every resource the coordinator must release on shutdown
//! - Release them once, in registration order, best-effort
//!
//! # Design Decisions
//! - Release consumes the registry, so no resource can be closed twice
//! - A failing close is logged and counted; the rest are still released

use std::fmt;
use std::sync::Arc;

use crate::observability::metrics;

/// Anything with a single release operation (listeners, watchers, servers).
pub trait Closeable: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn close(&self) -> std::io::Result<()>;
}

/// Registration-ordered set of closeable resources.
#[derive(Default, Clone)]
pub struct Closeables {
    resources: Vec<Arc<dyn Closeable>>,
}

/// Outcome of [`Closeables::release_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub released: usize,
    pub failed: usize,
}

impl Closeables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: Arc<dyn Closeable>) {
        tracing::debug!(resource = resource.name(), "Registered closeable resource");
        self.resources.push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Close every resource in registration order.
    pub fn release_all(self) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        for resource in self.resources {
            match resource.close() {
                Ok(()) => {
                    tracing::debug!(resource = resource.name(), "Resource released");
                    metrics::record_resource_release(true);
                    report.released += 1;
                }
                Err(e) => {
                    tracing::warn!(resource = resource.name(), error = %e, "Failed to release resource");
                    metrics::record_resource_release(false);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl fmt::Debug for Closeables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.resources.iter().map(|r| r.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorded {
        name: String,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Closeable for Recorded {
        fn name(&self) -> &str {
            &self.name
        }

        fn close(&self) -> std::io::Result<()> {
            self.log.lock().unwrap().push(self.name.clone());
            if self.fail {
                Err(std::io::Error::other("boom"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn releases_in_order_past_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut closeables = Closeables::new();
        for (name, fail) in [("listener", false), ("watcher", true), ("status", false)] {
            closeables.register(Arc::new(Recorded {
                name: name.to_string(),
                fail,
                log: log.clone(),
            }));
        }
        assert_eq!(closeables.len(), 3);
        assert!(!closeables.is_empty());

        let report = closeables.release_all();

        assert_eq!(report, ReleaseReport { released: 2, failed: 1 });
        assert_eq!(*log.lock().unwrap(), vec!["listener", "watcher", "status"]);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let closeables = Closeables::new();
        assert!(closeables.is_empty());

        let report = closeables.release_all();
        assert_eq!(report, ReleaseReport::default());
    }
}
