use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/day/:day/add", post(handlers::day_add))
        .route("/day/:day/sub", post(handlers::day_sub))
        .route("/reset", post(handlers::reset_form))
        .route("/api/week", get(handlers::get_week).put(handlers::put_week))
        .route("/api/week/reset", post(handlers::reset_week))
        .route("/api/day/:day", post(handlers::update_day))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/history", get(handlers::get_history))
        .route("/api/detect", post(handlers::auto_detect))
        .route("/api/message", post(handlers::message))
        .with_state(state)
}
