use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Mutex;

use crate::models::Stage;

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload. The recorder is process-wide, so
/// later calls return the handle installed by the first.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let mut installed = HANDLE
        .lock()
        .map_err(|_| anyhow::anyhow!("metrics handle lock poisoned"))?;
    if let Some(handle) = installed.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    for stage in Stage::ALL {
        let stage = stage.as_str();
        counter!("records_received_total", "stage" => stage).absolute(0);
        counter!("predictions_total", "stage" => stage).absolute(0);
        counter!("prediction_failures_total", "stage" => stage).absolute(0);
        counter!("validation_failures_total", "stage" => stage).absolute(0);
    }

    // Histogram is lazily created on first record; force creation.
    histogram!("stage_latency_seconds", "stage" => Stage::Acceptance.as_str()).record(0.0);

    *installed = Some(handle.clone());
    Ok(handle)
}
