use crate::detect::{DetectionMethod, PageSnapshot};
use crate::errors::TrackerError;
use crate::models::{DayUpdate, RawWeekData, ResetResponse, SuccessResponse, WeekDataResponse};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetWeekData,
    UpdateWeekData(RawWeekData),
    ResetWeek,
    SetDay { day: String, delta: i64 },
    DetectProblems(PageSnapshot),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub success: bool,
    pub problem_count: u64,
    pub method: DetectionMethod,
}

#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl FailureResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    WeekData(WeekDataResponse),
    Success(SuccessResponse),
    Reset(ResetResponse),
    Day(DayUpdate),
    Detection(DetectionResponse),
    Failure(FailureResponse),
}

pub async fn dispatch(state: &AppState, request: Request) -> Response {
    debug!(?request, "dispatching message");
    let result = match request {
        Request::GetWeekData => state
            .store
            .load()
            .await
            .map(|record| Response::WeekData(record.into())),
        Request::UpdateWeekData(data) => state
            .store
            .replace_all(data)
            .await
            .map(|_| Response::Success(SuccessResponse { success: true })),
        Request::ResetWeek => state.store.reset_week().await.map(|record| {
            Response::Reset(ResetResponse {
                success: true,
                counts: record.counts,
                week_id: record.week_id,
            })
        }),
        Request::SetDay { day, delta } => state.store.set_day(&day, delta).await.map(Response::Day),
        Request::DetectProblems(page) => Ok(detect(state, &page)),
    };
    result.unwrap_or_else(|err: TrackerError| {
        warn!("message failed: {err}");
        Response::Failure(FailureResponse::new(err))
    })
}

fn detect(state: &AppState, page: &PageSnapshot) -> Response {
    match state.detectors.detect(page) {
        Ok(detection) => Response::Detection(DetectionResponse {
            success: true,
            problem_count: detection.count,
            method: detection.method,
        }),
        Err(err) => Response::Failure(FailureResponse::new(err)),
    }
}
