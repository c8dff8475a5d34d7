//! Prometheus metrics recorder and `/metrics` rendering.

use broadcast_dispatch::dispatcher::{CAMPAIGNS_TOTAL, CANCELLATIONS_TOTAL, OUTCOMES_TOTAL};
use broadcast_janitor::janitor::{DELETE_FAILURES_TOTAL, FILES_DELETED_TOTAL};
use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// HTTP requests rejected before dispatch (counter, labels: reason).
pub const REQUESTS_REJECTED_TOTAL: &str = "http_requests_rejected_total";

/// Install the Prometheus metrics recorder (global).
///
/// Call once at startup, before any metric is recorded. Fails if another
/// recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

fn describe_metrics() {
    describe_counter!(CAMPAIGNS_TOTAL, "Campaigns accepted for dispatch");
    describe_counter!(OUTCOMES_TOTAL, "Per-recipient outcomes by status");
    describe_counter!(CANCELLATIONS_TOTAL, "Successful cancel requests");
    describe_counter!(FILES_DELETED_TOTAL, "Session files removed by the janitor");
    describe_counter!(DELETE_FAILURES_TOTAL, "Session files the janitor failed to remove");
    describe_counter!(REQUESTS_REJECTED_TOTAL, "Requests rejected before dispatch");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_local_recorder() {
        // Local recorder; a global install would leak across tests.
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!(CAMPAIGNS_TOTAL).increment(2);
        });
        let output = render(&handle);
        assert!(output.contains("dispatch_campaigns_total 2"));
    }

    #[test]
    fn metric_names_are_snake_case() {
        for name in [
            CAMPAIGNS_TOTAL,
            OUTCOMES_TOTAL,
            CANCELLATIONS_TOTAL,
            FILES_DELETED_TOTAL,
            DELETE_FAILURES_TOTAL,
            REQUESTS_REJECTED_TOTAL,
        ] {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{name}"
            );
        }
    }
}
