use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::pagination::PageQuery;
use crate::models::summary::{
    DaySummary, MonthSummary, PeriodTotals, SummaryPage, WeekSummary, YearSummary,
};
use crate::services::SummaryService;

#[derive(Clone)]
pub struct SummariesAppState {
    pub summaries: SummaryService,
}

pub fn summaries_routes(db: PgPool) -> Router {
    let shared_state = SummariesAppState {
        summaries: SummaryService::new(db),
    };

    Router::new()
        .route("/totals", get(get_totals))
        .route("/day", get(get_day_summaries))
        .route("/week", get(get_week_summaries))
        .route("/month", get(get_month_summaries))
        .route("/year", get(get_year_summaries))
        .with_state(shared_state)
}

pub async fn get_totals(State(state): State<SummariesAppState>) -> AppResult<Json<PeriodTotals>> {
    Ok(Json(state.summaries.overall_totals().await?))
}

pub async fn get_day_summaries(
    State(state): State<SummariesAppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> AppResult<Json<SummaryPage<DaySummary>>> {
    Ok(Json(state.summaries.day_page(query.page).await?))
}

pub async fn get_week_summaries(
    State(state): State<SummariesAppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> AppResult<Json<SummaryPage<WeekSummary>>> {
    Ok(Json(state.summaries.week_page(query.page).await?))
}

pub async fn get_month_summaries(
    State(state): State<SummariesAppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> AppResult<Json<SummaryPage<MonthSummary>>> {
    Ok(Json(state.summaries.month_page(query.page).await?))
}

pub async fn get_year_summaries(
    State(state): State<SummariesAppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> AppResult<Json<SummaryPage<YearSummary>>> {
    Ok(Json(state.summaries.year_page(query.page).await?))
}
