//! HTTP status endpoint.
//!
//! # Responsibilities
//! - Serve `GET /_status` with the reload status and whether we are stopping
//! - Optionally serve it over TLS with the reloadable certificate
//! - Shut down gracefully on request, without blocking the caller

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use futures_util::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::lifecycle::quit::QuitFlag;
use crate::status::reporter::{ReloadStatus, StatusReporter};

/// Grace period given to in-flight status requests on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Errors from the status endpoint.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("failed to bind status endpoint to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("status endpoint failed: {0}")]
    Serve(#[from] std::io::Error),

    #[error("status endpoint task panicked or was aborted")]
    Join,
}

/// The externally owned status endpoint as seen by the shutdown coordinator.
pub trait StatusEndpoint: Send + Sync {
    /// Begin shutting down and resolve once the endpoint has stopped.
    fn shutdown(&self) -> BoxFuture<'static, Result<(), StatusError>>;
}

#[derive(Clone)]
struct StatusState {
    reporter: StatusReporter,
    quit: QuitFlag,
}

/// Body of `GET /_status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub status: &'static str,
    pub reloads: u64,
}

/// Build the status router.
pub fn status_router(reporter: StatusReporter, quit: QuitFlag) -> Router {
    Router::new()
        .route("/_status", get(get_status))
        .with_state(StatusState { reporter, quit })
        .layer(TraceLayer::new_for_http())
}

async fn get_status(State(state): State<StatusState>) -> impl IntoResponse {
    let stopping = state.quit.is_quitting();
    let status = if stopping {
        "stopping"
    } else {
        match state.reporter.status() {
            ReloadStatus::Listening => "listening",
            ReloadStatus::Reloading => "reloading",
        }
    };

    let code = if stopping {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        Json(StatusResponse {
            ok: !stopping,
            status,
            reloads: state.reporter.reloads(),
        }),
    )
}

/// A running status endpoint.
pub struct StatusServer {
    handle: Handle,
    local_addr: SocketAddr,
    task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl StatusServer {
    /// Bind `addr` and start serving. With `tls`, the endpoint speaks HTTPS
    /// and follows certificate reloads. Must be called inside a Tokio runtime.
    pub fn start(
        addr: SocketAddr,
        tls: Option<RustlsConfig>,
        reporter: StatusReporter,
        quit: QuitFlag,
    ) -> Result<Self, StatusError> {
        let listener = std::net::TcpListener::bind(addr)
            .and_then(|l| l.set_nonblocking(true).map(|_| l))
            .map_err(|source| StatusError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| StatusError::Bind { addr, source })?;

        let handle = Handle::new();
        let app = status_router(reporter, quit).into_make_service();
        let secure = tls.is_some();

        let task = match tls {
            Some(tls) => tokio::spawn(
                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle.clone())
                    .serve(app),
            ),
            None => tokio::spawn(
                axum_server::from_tcp(listener)
                    .handle(handle.clone())
                    .serve(app),
            ),
        };

        tracing::info!(address = %local_addr, tls = secure, "Status endpoint listening");

        Ok(Self {
            handle,
            local_addr,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl StatusEndpoint for StatusServer {
    fn shutdown(&self) -> BoxFuture<'static, Result<(), StatusError>> {
        self.handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        let handle = self.handle.clone();
        let task = self.task.lock().ok().and_then(|mut t| t.take());

        Box::pin(async move {
            let Some(task) = task else {
                return Ok(());
            };
            let served = task.await.map_err(|_| StatusError::Join)?;
            served?;
            tracing::info!(open_connections = handle.connection_count(), "Status endpoint stopped");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_listening_then_stopping() {
        let reporter = StatusReporter::new();
        let quit = QuitFlag::new();
        let server = StatusServer::start(
            "127.0.0.1:0".parse().unwrap(),
            None,
            reporter.clone(),
            quit.clone(),
        )
        .unwrap();
        let url = format!("http://{}/_status", server.local_addr());
        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["status"], "listening");

        reporter.set_reloading();
        let body: serde_json::Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "reloading");
        reporter.set_listening();

        quit.set_quitting();
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 503);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["status"], "stopping");
        assert_eq!(body["reloads"], 1);

        drop(client);
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn second_shutdown_is_a_no_op() {
        let server = StatusServer::start(
            "127.0.0.1:0".parse().unwrap(),
            None,
            StatusReporter::new(),
            QuitFlag::new(),
        )
        .unwrap();

        server.shutdown().await.unwrap();
        server.shutdown().await.unwrap();
    }
}
