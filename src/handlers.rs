use crate::detect::{DetectionMethod, PageSnapshot};
use crate::errors::{AppError, PageError};
use crate::messages::{self, Request, Response};
use crate::models::{
    DayUpdate, DeltaRequest, RawWeekData, ResetResponse, SuccessResponse, WeekDataResponse,
};
use crate::state::AppState;
use crate::stats::{build_history, build_summary, HistoryPoint, WeekSummary};
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Json,
};
use serde::Serialize;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let record = state.store.load().await?;
    Ok(Html(render_index(&build_summary(&record, state.weekly_goal))))
}

pub async fn day_add(
    State(state): State<AppState>,
    Path(day): Path<String>,
) -> Result<Redirect, PageError> {
    state.store.set_day(&day, 1).await?;
    Ok(Redirect::to("/"))
}

pub async fn day_sub(
    State(state): State<AppState>,
    Path(day): Path<String>,
) -> Result<Redirect, PageError> {
    state.store.set_day(&day, -1).await?;
    Ok(Redirect::to("/"))
}

pub async fn reset_form(State(state): State<AppState>) -> Result<Redirect, PageError> {
    state.store.reset_week().await?;
    Ok(Redirect::to("/"))
}

pub async fn get_week(State(state): State<AppState>) -> Result<Json<WeekDataResponse>, AppError> {
    let record = state.store.load().await?;
    Ok(Json(record.into()))
}

pub async fn put_week(
    State(state): State<AppState>,
    Json(payload): Json<RawWeekData>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.store.replace_all(payload).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn reset_week(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    let record = state.store.reset_week().await?;
    Ok(Json(ResetResponse {
        success: true,
        counts: record.counts,
        week_id: record.week_id,
    }))
}

pub async fn update_day(
    State(state): State<AppState>,
    Path(day): Path<String>,
    Json(payload): Json<DeltaRequest>,
) -> Result<Json<DayUpdate>, AppError> {
    let update = state.store.set_day(&day, payload.delta).await?;
    Ok(Json(update))
}

pub async fn get_summary(State(state): State<AppState>) -> Result<Json<WeekSummary>, AppError> {
    let record = state.store.load().await?;
    Ok(Json(build_summary(&record, state.weekly_goal)))
}

pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryPoint>>, AppError> {
    let backups = state.store.backups().await?;
    Ok(Json(build_history(&backups)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDetectResponse {
    pub success: bool,
    pub problem_count: u64,
    pub method: DetectionMethod,
    pub update: Option<DayUpdate>,
}

pub async fn auto_detect(
    State(state): State<AppState>,
    Json(page): Json<PageSnapshot>,
) -> Result<Json<AutoDetectResponse>, AppError> {
    let detection = state
        .detectors
        .detect(&page)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let update = if detection.count > 0 {
        let update = state.store.set_today(detection.count).await?;
        info!(day = %update.day, count = update.count, "applied detected count");
        Some(update)
    } else {
        None
    };

    Ok(Json(AutoDetectResponse {
        success: true,
        problem_count: detection.count,
        method: detection.method,
        update,
    }))
}

pub async fn message(
    State(state): State<AppState>,
    Json(request): Json<Request>,
) -> Json<Response> {
    Json(messages::dispatch(&state, request).await)
}
