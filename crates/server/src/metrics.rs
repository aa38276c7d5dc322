//! Prometheus metrics
//!
//! Installs the global recorder once and renders it at `GET /metrics`.
//! Turn and latency metrics are emitted where the work happens (agent and
//! pipeline crates); session lifecycle metrics live here.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder, returning its handle
///
/// Safe to call more than once; later calls return the first handle.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PROMETHEUS.get_or_try_init(|| PrometheusBuilder::new().install_recorder()) {
        Ok(handle) => Some(handle.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

pub fn record_session_created() {
    metrics::counter!("tutor_sessions_created_total").increment(1);
}

pub fn record_sessions_expired(count: usize) {
    metrics::counter!("tutor_sessions_expired_total").increment(count as u64);
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics disabled\n".to_string(),
        ),
    }
}
