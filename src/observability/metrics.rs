//! Metrics collection and exposition.
//!
//! # Metrics
//! - `supervisor_triggers_total` (counter): lifecycle events by trigger
//! - `supervisor_reloads_total` (counter): credential reloads by outcome
//! - `supervisor_resources_released_total` (counter): closeables by outcome
//! - `supervisor_signals_forwarded_total` (counter): signals relayed to the child
//! - `supervisor_forced_exits_total` (counter): deadline escalations
//! - `supervisor_quitting` (gauge): 1 once shutdown has begun
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_trigger(trigger: &'static str) {
    metrics::counter!("supervisor_triggers_total", "trigger" => trigger).increment(1);
}

pub fn record_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("supervisor_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_resource_release(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("supervisor_resources_released_total", "outcome" => outcome).increment(1);
}

pub fn record_forwarded_signal(signal: &'static str) {
    metrics::counter!("supervisor_signals_forwarded_total", "signal" => signal).increment(1);
}

pub fn record_forced_exit() {
    metrics::counter!("supervisor_forced_exits_total").increment(1);
}

pub fn record_quitting() {
    metrics::gauge!("supervisor_quitting").set(1.0);
}
