pub mod api;
pub mod config;
pub mod errors;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod prediction;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::prediction::LoanPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LoanPipeline>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
