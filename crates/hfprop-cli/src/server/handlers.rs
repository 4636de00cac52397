use super::error::ApiResult;
use super::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use hfprop_core::domain::{BandResult, HourlyBatchResult, PredictionResult};
use hfprop_core::modules::{HealthReport, PredictionQuery, probe};
use hfprop_core::{BatchOrchestrator, RequestValidator, map_bands};

pub async fn predict(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<PredictionResult>> {
    let request = RequestValidator::new(&state.bands).validate(&query)?;
    let result = state.predictor.predict(&request).await?;
    Ok(Json(result))
}

pub async fn predict_hourly(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<HourlyBatchResult>> {
    let request = RequestValidator::new(&state.bands).validate(&query)?;
    let batch = BatchOrchestrator::new(&state.predictor, state.engine.batch_workers)
        .run(&request)
        .await;
    Ok(Json(batch))
}

pub async fn bands(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<BandResult>> {
    let request = RequestValidator::new(&state.bands).validate(&query)?;
    let result = state.predictor.predict(&request).await?;
    Ok(Json(map_bands(&result, &state.bands)))
}

/// 200 when the engine installation is complete, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = probe(&state.engine);
    let status = if report.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
