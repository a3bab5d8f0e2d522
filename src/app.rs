use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/week", get(handlers::get_week))
        .route("/api/exercise", post(handlers::update_exercise))
        .route("/api/archive", get(handlers::get_archive))
        .route("/api/export", get(handlers::export))
        .with_state(state)
}
