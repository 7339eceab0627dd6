use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use axum_extra::extract::WithRejection;
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::ingest::decode_submission;
use crate::models::detail::WorkoutDetail;
use crate::models::pagination::{Page, PageQuery};
use crate::models::workout::{
    CreateManualWorkoutRequest, SubmitJsonWorkoutRequest, UpdateNotesRequest, Workout,
    WorkoutCreatedResponse, WorkoutListItem,
};
use crate::services::{DetailService, ImportService, WorkoutService};

#[derive(Clone)]
pub struct WorkoutsAppState {
    pub workouts: WorkoutService,
    pub imports: ImportService,
    pub details: DetailService,
}

pub fn workouts_routes(db: PgPool) -> Router {
    let shared_state = WorkoutsAppState {
        workouts: WorkoutService::new(db.clone()),
        imports: ImportService::new(db.clone()),
        details: DetailService::new(db),
    };

    Router::new()
        .route("/", get(list_workouts))
        .route("/manual", post(create_manual_workout))
        .route("/json", post(submit_json_workout))
        .route("/:workout_id", get(get_workout).delete(delete_workout))
        .route("/:workout_id/notes", patch(update_notes))
        .with_state(shared_state)
}

/// Paginated workout log, newest first
pub async fn list_workouts(
    State(state): State<WorkoutsAppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> AppResult<Json<Page<WorkoutListItem>>> {
    Ok(Json(state.workouts.list_paginated(query.page).await?))
}

pub async fn create_manual_workout(
    State(state): State<WorkoutsAppState>,
    WithRejection(Json(request), _): WithRejection<Json<CreateManualWorkoutRequest>, AppError>,
) -> AppResult<(StatusCode, Json<Workout>)> {
    let workout = state.workouts.create_manual(request).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

/// Import a machine export. `json_data` may be the document itself or a
/// string containing it.
pub async fn submit_json_workout(
    State(state): State<WorkoutsAppState>,
    WithRejection(Json(request), _): WithRejection<Json<SubmitJsonWorkoutRequest>, AppError>,
) -> AppResult<(StatusCode, Json<WorkoutCreatedResponse>)> {
    let document = decode_submission(request.json_data)?;
    let created = state.imports.import_export(&document, request.notes).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Workout with its charts and heart-rate data
pub async fn get_workout(
    State(state): State<WorkoutsAppState>,
    WithRejection(Path(workout_id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<WorkoutDetail>> {
    Ok(Json(state.details.detail(workout_id).await?))
}

pub async fn update_notes(
    State(state): State<WorkoutsAppState>,
    WithRejection(Path(workout_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateNotesRequest>, AppError>,
) -> AppResult<Json<Workout>> {
    let workout = state.workouts.update_notes(workout_id, request.notes).await?;
    info!("Updated notes for workout {}", workout_id);
    Ok(Json(workout))
}

pub async fn delete_workout(
    State(state): State<WorkoutsAppState>,
    WithRejection(Path(workout_id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<StatusCode> {
    state.workouts.delete(workout_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
