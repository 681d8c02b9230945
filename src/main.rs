use std::sync::Arc;

use loanstages::api::router::create_router;
use loanstages::config::{AppConfig, LogFormat};
use loanstages::inference::ModelStore;
use loanstages::prediction::LoanPipeline;
use loanstages::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);
    let addr = format!("{}:{}", config.host, config.port);

    let metrics_handle = loanstages::metrics::init_metrics()?;

    tracing::info!(models_dir = %config.models_dir.display(), "Loading stage models...");
    let store = ModelStore::load_dir(&config.models_dir)?;
    let pipeline = LoanPipeline::new(&store, config.failure_policy);

    for (stage, model) in pipeline.model_names() {
        tracing::info!(%stage, %model, "Stage ready");
    }
    tracing::info!(
        failure_policy = %config.failure_policy,
        max_batch_size = config.max_batch_size,
        "Pipeline configured"
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}
