//! Shared fakes for lifecycle integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use nix::sys::signal::Signal;
use tokio::sync::mpsc;

use tunnel_supervisor::credentials::{CredentialError, CredentialManager};
use tunnel_supervisor::lifecycle::{Closeable, ForceExit, ProcessGroupSignaler};
use tunnel_supervisor::status::{ReloadStatus, StatusEndpoint, StatusError, StatusReporter};

/// Credential manager that counts reloads and records the status it saw mid-reload.
pub struct RecordingCredentials {
    fail: bool,
    calls: AtomicUsize,
    status: StatusReporter,
    observed: Mutex<Vec<ReloadStatus>>,
}

impl RecordingCredentials {
    pub fn new(status: StatusReporter) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
            status,
            observed: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: StatusReporter) -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
            status,
            observed: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn observed(&self) -> Vec<ReloadStatus> {
        self.observed.lock().unwrap().clone()
    }
}

impl CredentialManager for RecordingCredentials {
    fn reload(&self) -> Result<(), CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.observed.lock().unwrap().push(self.status.status());
        if self.fail {
            return Err(CredentialError::NoCertificates(PathBuf::from("server.crt")));
        }
        Ok(())
    }
}

/// Process group that records every signal instead of delivering it.
#[derive(Default)]
pub struct RecordingSignaler {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingSignaler {
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }
}

impl ProcessGroupSignaler for RecordingSignaler {
    fn pgid(&self) -> i32 {
        31337
    }

    fn signal_group(&self, signal: Signal) -> nix::Result<()> {
        self.signals.lock().unwrap().push(signal);
        Ok(())
    }
}

/// A [`ForceExit`] whose exit call only records the code.
pub fn recording_force_exit(child: Option<Arc<dyn ProcessGroupSignaler>>) -> (Arc<ForceExit>, Arc<Mutex<Vec<i32>>>) {
    let codes = Arc::new(Mutex::new(Vec::new()));
    let recorded = codes.clone();
    let escalation = ForceExit::with_exit(child, move |code| recorded.lock().unwrap().push(code));
    (Arc::new(escalation), codes)
}

/// Closeable that sleeps for `delay` before reporting success.
pub struct SlowResource {
    name: String,
    delay: Duration,
    closes: AtomicUsize,
}

impl SlowResource {
    pub fn new(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay,
            closes: AtomicUsize::new(0),
        })
    }

    pub fn instant(name: &str) -> Arc<Self> {
        Self::new(name, Duration::ZERO)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Closeable for SlowResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&self) -> std::io::Result<()> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Closeable whose release always fails.
pub struct FailingResource;

impl Closeable for FailingResource {
    fn name(&self) -> &str {
        "failing"
    }

    fn close(&self) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer went away"))
    }
}

/// Status endpoint that reports each shutdown request on a channel.
pub struct RecordingEndpoint {
    tx: mpsc::UnboundedSender<()>,
}

impl RecordingEndpoint {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl StatusEndpoint for RecordingEndpoint {
    fn shutdown(&self) -> BoxFuture<'static, Result<(), StatusError>> {
        let _ = self.tx.send(());
        async { Ok(()) }.boxed()
    }
}

/// Write a self-signed certificate/key pair for `localhost` into `dir`.
pub fn write_credentials(dir: &Path) -> (PathBuf, PathBuf) {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let cert = rcgen::CertificateParams::new(vec!["localhost".to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();

    let cert_path = dir.join("server.crt");
    let key_path = dir.join("server.key");
    fs::write(&cert_path, cert.pem()).unwrap();
    fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}
