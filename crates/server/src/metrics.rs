//! Prometheus metrics: installs the global recorder, exposes `GET /metrics`.
//!
//! Counter/histogram names follow the teacher's convention of
//! `<subsystem>_<noun>_total`/`_seconds` with label sets rather than baking
//! the label values into the metric name.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Installs the process-wide Prometheus recorder. Call once at startup,
/// before the first `metrics::counter!`/`histogram!` call.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )
        .expect("valid histogram buckets")
        .install_recorder()
        .expect("install prometheus recorder")
}

pub async fn metrics_handler(axum::extract::State(state): axum::extract::State<crate::state::AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.render())
}

pub fn record_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_str = status.to_string();
    metrics::counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status_str).increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.to_string(), "path" => path.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_invoice_operation(operation: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    metrics::counter!("invoice_operations_total", "operation" => operation, "status" => status).increment(1);
}

pub fn record_business_operation(operation: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    metrics::counter!("business_operations_total", "operation" => operation.to_string(), "status" => status).increment(1);
}

pub fn record_voice_session_started() {
    metrics::counter!("voice_sessions_total").increment(1);
}
