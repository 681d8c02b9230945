use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};

use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Loan evaluation pipeline is running" }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let models: Map<String, Value> = state
        .pipeline
        .model_names()
        .into_iter()
        .map(|(stage, model)| (stage.as_str().to_string(), Value::from(model)))
        .collect();

    Json(json!({
        "status": "healthy",
        "failure_policy": state.pipeline.policy(),
        "models": models,
    }))
}
