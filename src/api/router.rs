use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route("/api/stages/:stage/fields", get(handlers::stages::fields));

    // Stage endpoints keep the trailing slash the front-end posts to
    let stages = Router::new()
        .route(
            "/step1_accepted_rejected_prediction/",
            post(handlers::stages::acceptance),
        )
        .route("/step2_grade_prediction/", post(handlers::stages::grade))
        .route("/step3_subgrade_prediction/", post(handlers::stages::subgrade))
        .route("/step4_int_rate_prediction/", post(handlers::stages::interest_rate));

    // CORS: the front-end is served from its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(stages)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
