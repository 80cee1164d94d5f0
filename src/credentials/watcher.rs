//! Credential file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::credentials::error::WatcherError;
use crate::lifecycle::closeable::Closeable;

/// Watches the certificate and key files and emits a notification whenever
/// either is modified or (re)created.
///
/// Notifications carry no payload; the coordinator decides what to reload.
/// Duplicates are expected (one write often yields several events) and are
/// harmless because reload is idempotent.
pub struct CredentialWatcher {
    files: Vec<PathBuf>,
    notify_tx: mpsc::UnboundedSender<()>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl CredentialWatcher {
    /// Create a watcher for `files`.
    ///
    /// Returns the watcher and the receiver for change notifications.
    pub fn new(files: &[&Path]) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        (
            Self {
                files: files.iter().map(|p| p.to_path_buf()).collect(),
                notify_tx,
                watcher: Mutex::new(None),
                ticker: Mutex::new(None),
            },
            notify_rx,
        )
    }

    /// Start watching the directories that hold the files.
    ///
    /// Directories rather than files are watched so atomic rename-into-place
    /// rotations are still seen.
    pub fn start(&self) -> Result<(), WatcherError> {
        let tx = self.notify_tx.clone();
        let files = self.files.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| files.iter().any(|f| p.ends_with(f) || f.ends_with(p)))
                    {
                        tracing::info!(paths = ?event.paths, "Credential change detected");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        for dir in self.watch_dirs()? {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            tracing::info!(path = ?dir, "Credential watcher started");
        }

        if let Ok(mut slot) = self.watcher.lock() {
            *slot = Some(watcher);
        }
        Ok(())
    }

    /// Additionally emit a notification every `interval`. Must be called inside a Tokio runtime.
    pub fn start_timed_reload(&self, interval: Duration) {
        let tx = self.notify_tx.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracing::debug!("Timed credential reload");
                if tx.send(()).is_err() {
                    break;
                }
            }
        });

        tracing::info!(interval = ?interval, "Timed credential reload enabled");
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(previous) = slot.replace(task) {
                previous.abort();
            }
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.lock().map(|w| w.is_some()).unwrap_or(false)
    }

    fn watch_dirs(&self) -> Result<Vec<PathBuf>, WatcherError> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for file in &self.files {
            let dir = match file.parent() {
                Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
                Some(p) => p.to_path_buf(),
                None => return Err(WatcherError::NoParent(file.clone())),
            };
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        Ok(dirs)
    }
}

impl Closeable for CredentialWatcher {
    fn name(&self) -> &str {
        "credential-watcher"
    }

    fn close(&self) -> std::io::Result<()> {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        let mut slot = self
            .watcher
            .lock()
            .map_err(|_| std::io::Error::other("credential watcher lock poisoned"))?;
        drop(slot.take());
        tracing::debug!("Credential watcher stopped");
        Ok(())
    }
}
