use crate::ui::render_error;
use axum::{http::StatusCode, response::Html, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage rejected write: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid week data: {0}")]
    Validation(String),
    #[error("unknown day '{0}'")]
    InvalidDay(String),
    #[error("counter store is not running")]
    StoreClosed,
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Validation(_) | TrackerError::InvalidDay(_) => {
                Self::bad_request(err.to_string())
            }
            other => {
                tracing::error!("request failed: {other}");
                Self::internal(other)
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

#[derive(Debug)]
pub struct PageError(AppError);

impl From<TrackerError> for PageError {
    fn from(err: TrackerError) -> Self {
        Self(err.into())
    }
}

impl axum::response::IntoResponse for PageError {
    fn into_response(self) -> axum::response::Response {
        let PageError(AppError { status, message }) = self;
        (status, Html(render_error(status, &message))).into_response()
    }
}
