use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use axum_extra::extract::WithRejection;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::ranking::{
    CreateRankingSettingRequest, RankingBoard, RankingQuery, RankingSetting, RankingsResponse,
};
use crate::models::validation::parse_month_key;
use crate::services::RankingService;

#[derive(Clone)]
pub struct RankingsAppState {
    pub rankings: RankingService,
}

pub fn rankings_routes(db: PgPool) -> Router {
    let shared_state = RankingsAppState {
        rankings: RankingService::new(db),
    };

    Router::new()
        .route("/", get(get_rankings))
        .route("/settings", get(list_ranking_settings).post(create_ranking_setting))
        .route("/settings/:ranking_id", delete(delete_ranking_setting))
        .route("/:ranking_id/month/:month_key", get(get_month_ranking))
        .with_state(shared_state)
}

/// All boards, overall or for `?year=`
pub async fn get_rankings(
    State(state): State<RankingsAppState>,
    WithRejection(Query(query), _): WithRejection<Query<RankingQuery>, AppError>,
) -> AppResult<Json<RankingsResponse>> {
    Ok(Json(state.rankings.boards(query.year).await?))
}

pub async fn get_month_ranking(
    State(state): State<RankingsAppState>,
    WithRejection(Path((ranking_id, month_key)), _): WithRejection<Path<(i32, String)>, AppError>,
) -> AppResult<Json<RankingBoard>> {
    let (year, month) = parse_month_key(&month_key)?;
    Ok(Json(state.rankings.month_board(ranking_id, year, month).await?))
}

pub async fn list_ranking_settings(
    State(state): State<RankingsAppState>,
) -> AppResult<Json<Vec<RankingSetting>>> {
    Ok(Json(state.rankings.list_settings().await?))
}

pub async fn create_ranking_setting(
    State(state): State<RankingsAppState>,
    WithRejection(Json(request), _): WithRejection<Json<CreateRankingSettingRequest>, AppError>,
) -> AppResult<(StatusCode, Json<RankingSetting>)> {
    let setting = state.rankings.create_setting(request).await?;
    Ok((StatusCode::CREATED, Json(setting)))
}

pub async fn delete_ranking_setting(
    State(state): State<RankingsAppState>,
    WithRejection(Path(ranking_id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<StatusCode> {
    state.rankings.delete_setting(ranking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
