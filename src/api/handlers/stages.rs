use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::schema::{FieldKind, FieldSpec, Requirement};
use crate::models::Stage;
use crate::prediction::{LoanPipeline, PipelineError, Predictions};
use crate::AppState;

/// Response header carrying the number of positions that got no result.
pub const PREDICTION_FAILURES_HEADER: &str = "x-prediction-failures";

/// POST /step1_accepted_rejected_prediction/
pub async fn acceptance(
    State(state): State<AppState>,
    body: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Response, AppError> {
    run_stage(state, body, |pipeline, records| pipeline.predict_acceptance(records)).await
}

/// POST /step2_grade_prediction/
pub async fn grade(
    State(state): State<AppState>,
    body: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Response, AppError> {
    run_stage(state, body, |pipeline, records| pipeline.predict_grade(records)).await
}

/// POST /step3_subgrade_prediction/
///
/// Every record must carry its `grade`.
pub async fn subgrade(
    State(state): State<AppState>,
    body: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Response, AppError> {
    run_stage(state, body, |pipeline, records| pipeline.predict_subgrade(records)).await
}

/// POST /step4_int_rate_prediction/
///
/// Every record must carry `grade` and a `sub_grade` within that grade.
pub async fn interest_rate(
    State(state): State<AppState>,
    body: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Response, AppError> {
    run_stage(state, body, |pipeline, records| {
        pipeline.predict_interest_rate(records)
    })
    .await
}

async fn run_stage<T, F>(
    state: AppState,
    body: Result<Json<Vec<Value>>, JsonRejection>,
    predict: F,
) -> Result<Response, AppError>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&LoanPipeline, &[Value]) -> Result<Predictions<T>, PipelineError> + Send + 'static,
{
    let Json(records) = body.map_err(|e| {
        AppError::BadRequest(format!("expected a JSON array of loan records: {}", e.body_text()))
    })?;

    let max = state.config.max_batch_size;
    if records.len() > max {
        return Err(AppError::BadRequest(format!(
            "batch of {} records exceeds the maximum of {max}",
            records.len()
        )));
    }

    let pipeline = state.pipeline.clone();
    let predictions = tokio::task::spawn_blocking(move || predict(&*pipeline, &records[..]))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    let failures = predictions.failures().len();
    let mut response = Json(predictions).into_response();
    if failures > 0 {
        response.headers_mut().insert(
            HeaderName::from_static(PREDICTION_FAILURES_HEADER),
            HeaderValue::from(failures),
        );
    }
    Ok(response)
}

/// GET /api/stages/:stage/fields
///
/// The record schema a stage accepts.
pub async fn fields(Path(stage): Path<String>) -> Result<Json<Value>, AppError> {
    let stage = Stage::from_str(&stage)
        .ok_or_else(|| AppError::NotFound(format!("unknown stage `{stage}`")))?;

    let (specs, derived) = stage.schema();
    let fields: Vec<Value> = specs.into_iter().map(field_json).collect();
    let derived: Vec<&str> = derived.iter().map(|d| d.column()).collect();

    Ok(Json(json!({
        "stage": stage,
        "fields": fields,
        "derived": derived,
    })))
}

fn field_json(spec: &FieldSpec) -> Value {
    let mut field = json!({
        "name": spec.name,
        "kind": spec.kind.type_name(),
    });

    match spec.requirement {
        Requirement::Default(default) => {
            field["default"] = default.to_json();
        }
        Requirement::Dependency { hint } => {
            field["required"] = Value::Bool(true);
            field["hint"] = Value::from(hint);
        }
    }

    match spec.kind {
        FieldKind::Numeric { min, max } => {
            field["minimum"] = json!(min);
            field["maximum"] = json!(max);
        }
        kind => {
            field["accepted"] = json!(kind.accepted_labels());
        }
    }

    field
}
