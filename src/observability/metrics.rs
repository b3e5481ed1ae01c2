//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frp_auth_decisions_total` (counter): decisions by `op` and `outcome`
//! - `frp_auth_protocol_errors_total` (counter): bad requests by `kind`
//! - `frp_auth_config_reloads_total` (counter): reload attempts by `result`
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decision(op: &'static str, outcome: &'static str) {
    counter!("frp_auth_decisions_total", "op" => op, "outcome" => outcome).increment(1);
}

pub fn record_protocol_error(kind: &'static str) {
    counter!("frp_auth_protocol_errors_total", "kind" => kind).increment(1);
}

pub fn record_reload(result: &'static str) {
    counter!("frp_auth_config_reloads_total", "result" => result).increment(1);
}
