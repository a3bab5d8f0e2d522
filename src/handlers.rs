use crate::errors::AppError;
use crate::models::{ArchiveEntry, ExerciseRequest, ExerciseResponse, ExerciseUpdate, WeekResponse};
use crate::report::export_filename;
use crate::state::AppState;
use crate::ui::render_index;
use crate::week::WeekKey;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use chrono::Local;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let week = tracker.ensure_current_week()?;
    let current = tracker.get_state(&week);
    Ok(Html(render_index(&week, &current)))
}

pub async fn get_week(State(state): State<AppState>) -> Result<Json<WeekResponse>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let week = tracker.ensure_current_week()?;
    let current = tracker.get_state(&week);
    Ok(Json(WeekResponse {
        week,
        state: current,
    }))
}

pub async fn update_exercise(
    State(state): State<AppState>,
    Json(payload): Json<ExerciseRequest>,
) -> Result<Json<ExerciseResponse>, AppError> {
    let week: WeekKey = payload
        .week
        .trim()
        .parse::<WeekKey>()
        .map_err(|err| AppError::bad_request(err.to_string()))?;
    let update = ExerciseUpdate::from_parts(&payload.field, &payload.value)?;

    let mut tracker = state.tracker.lock().await;
    let entry = tracker.update_exercise(&week, &payload.day, &payload.exercise, update)?;

    Ok(Json(ExerciseResponse {
        week,
        day: payload.day,
        exercise: payload.exercise,
        entry,
    }))
}

pub async fn get_archive(State(state): State<AppState>) -> Json<Vec<ArchiveEntry>> {
    let tracker = state.tracker.lock().await;
    Json(tracker.archive())
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut tracker = state.tracker.lock().await;
    let week = tracker.ensure_current_week()?;
    let text = tracker.export(&week, Local::now().naive_local());
    let filename = export_filename(&week);
    info!(%week, %filename, "exported workout log");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        text,
    ))
}
