use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{PeriodTotals, WorkoutListItem};
use crate::services::workout_service::LATEST_WORKOUTS;
use crate::services::{SummaryService, WorkoutService};

#[derive(Clone)]
pub struct HomeAppState {
    pub workouts: WorkoutService,
    pub summaries: SummaryService,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub latest_workouts: Vec<WorkoutListItem>,
    pub totals: PeriodTotals,
}

pub fn home_routes(db: PgPool) -> Router {
    let shared_state = HomeAppState {
        workouts: WorkoutService::new(db.clone()),
        summaries: SummaryService::new(db),
    };

    Router::new()
        .route("/", get(get_home))
        .with_state(shared_state)
}

/// Latest workouts and all-time totals
pub async fn get_home(State(state): State<HomeAppState>) -> AppResult<Json<HomeResponse>> {
    Ok(Json(HomeResponse {
        latest_workouts: state.workouts.latest(LATEST_WORKOUTS).await?,
        totals: state.summaries.overall_totals().await?,
    }))
}
