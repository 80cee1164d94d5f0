//! Credential reload with status reporting.

use std::sync::Arc;

use crate::credentials::{CredentialError, CredentialManager};
use crate::lifecycle::events::LifecycleEvent;
use crate::observability::metrics;
use crate::status::StatusReporter;

/// Runs a credential reload and keeps the reported status accurate around it.
///
/// Status reads `Reloading` only while the attempt is in flight and reverts to
/// `Listening` on every exit path, unwinding included. Failures never touch
/// the quit flag or any closeable resource.
#[derive(Clone)]
pub struct ReloadCoordinator {
    credentials: Arc<dyn CredentialManager>,
    status: StatusReporter,
}

impl ReloadCoordinator {
    pub fn new(credentials: Arc<dyn CredentialManager>, status: StatusReporter) -> Self {
        Self { credentials, status }
    }

    /// Reload credentials in response to `trigger`, logging any failure.
    ///
    /// The previous credentials remain active on failure.
    pub fn handle(&self, trigger: LifecycleEvent) {
        if let Err(e) = self.reload(trigger) {
            tracing::error!(trigger = %trigger, error = %e, "Error reloading, keeping previous certificates");
        }
        tracing::info!("Reloading complete");
    }

    /// Reload credentials and return the outcome to the caller.
    pub fn reload(&self, trigger: LifecycleEvent) -> Result<(), CredentialError> {
        tracing::info!(trigger = %trigger, "Reloading certificates");

        let result = {
            let _reloading = ReloadingGuard::enter(&self.status);
            self.credentials.reload()
        };
        metrics::record_reload(result.is_ok());

        result
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }
}

struct ReloadingGuard<'a> {
    status: &'a StatusReporter,
}

impl<'a> ReloadingGuard<'a> {
    fn enter(status: &'a StatusReporter) -> Self {
        status.set_reloading();
        Self { status }
    }
}

impl Drop for ReloadingGuard<'_> {
    fn drop(&mut self) {
        self.status.set_listening();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ReloadStatus;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Scripted {
        fail: bool,
        status: StatusReporter,
        seen: Mutex<Vec<ReloadStatus>>,
    }

    impl CredentialManager for Scripted {
        fn reload(&self) -> Result<(), CredentialError> {
            self.seen.lock().unwrap().push(self.status.status());
            if self.fail {
                Err(CredentialError::NoCertificates(PathBuf::from("server.crt")))
            } else {
                Ok(())
            }
        }
    }

    fn coordinator(fail: bool) -> (ReloadCoordinator, Arc<Scripted>) {
        let status = StatusReporter::new();
        let creds = Arc::new(Scripted {
            fail,
            status: status.clone(),
            seen: Mutex::new(Vec::new()),
        });
        (ReloadCoordinator::new(creds.clone(), status), creds)
    }

    #[test]
    fn reloading_only_during_attempt() {
        let (reload, creds) = coordinator(false);

        reload.reload(LifecycleEvent::ReloadSignal).unwrap();

        assert_eq!(*creds.seen.lock().unwrap(), vec![ReloadStatus::Reloading]);
        assert_eq!(reload.status().status(), ReloadStatus::Listening);
        assert_eq!(reload.status().reloads(), 1);
    }

    #[test]
    fn failure_reverts_status() {
        let (reload, creds) = coordinator(true);

        assert!(reload.reload(LifecycleEvent::WatcherNotify).is_err());

        assert_eq!(*creds.seen.lock().unwrap(), vec![ReloadStatus::Reloading]);
        assert_eq!(reload.status().status(), ReloadStatus::Listening);
    }

    #[test]
    fn handle_absorbs_failure_and_reverts_status() {
        let (reload, creds) = coordinator(true);

        reload.handle(LifecycleEvent::ReloadSignal);
        reload.handle(LifecycleEvent::WatcherNotify);

        assert_eq!(creds.seen.lock().unwrap().len(), 2);
        assert_eq!(reload.status().status(), ReloadStatus::Listening);
        assert_eq!(reload.status().reloads(), 2);
    }

    #[test]
    fn panicking_reload_still_reverts_status() {
        struct Panics;
        impl CredentialManager for Panics {
            fn reload(&self) -> Result<(), CredentialError> {
                panic!("parser bug");
            }
        }

        let status = StatusReporter::new();
        let reload = ReloadCoordinator::new(Arc::new(Panics), status.clone());
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = reload.reload(LifecycleEvent::ReloadSignal);
        }));

        assert!(outcome.is_err());
        assert_eq!(status.status(), ReloadStatus::Listening);
    }
}
