use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::summary::{DateDrillDown, MonthDrillDown, WeekDrillDown, YearDrillDown};
use crate::models::validation::parse_iso_date;
use crate::services::SummaryService;

#[derive(Clone)]
pub struct PeriodsAppState {
    pub summaries: SummaryService,
}

/// Drill-downs into a single date, ISO week, month or year.
pub fn periods_routes(db: PgPool) -> Router {
    let shared_state = PeriodsAppState {
        summaries: SummaryService::new(db),
    };

    Router::new()
        .route("/date/:date", get(get_date))
        .route("/week/:week_key", get(get_week))
        .route("/month/:month_key", get(get_month))
        .route("/year/:year", get(get_year))
        .with_state(shared_state)
}

pub async fn get_date(
    State(state): State<PeriodsAppState>,
    WithRejection(Path(date), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<DateDrillDown>> {
    let date = parse_iso_date(&date)?;
    Ok(Json(state.summaries.date_drill_down(date).await?))
}

pub async fn get_week(
    State(state): State<PeriodsAppState>,
    WithRejection(Path(week_key), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<WeekDrillDown>> {
    Ok(Json(state.summaries.week_drill_down(&week_key).await?))
}

pub async fn get_month(
    State(state): State<PeriodsAppState>,
    WithRejection(Path(month_key), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<MonthDrillDown>> {
    Ok(Json(state.summaries.month_drill_down(&month_key).await?))
}

pub async fn get_year(
    State(state): State<PeriodsAppState>,
    WithRejection(Path(year), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<YearDrillDown>> {
    Ok(Json(state.summaries.year_drill_down(year).await?))
}
