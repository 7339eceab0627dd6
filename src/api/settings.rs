use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use axum_extra::extract::WithRejection;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::settings::{UpdateSettingRequest, UserSetting};
use crate::services::SettingsService;

#[derive(Clone)]
pub struct SettingsAppState {
    pub settings: SettingsService,
}

pub fn settings_routes(db: PgPool) -> Router {
    let shared_state = SettingsAppState {
        settings: SettingsService::new(db),
    };

    Router::new()
        .route("/", get(list_settings))
        .route("/:key", put(update_setting))
        .with_state(shared_state)
}

pub async fn list_settings(State(state): State<SettingsAppState>) -> AppResult<Json<Vec<UserSetting>>> {
    Ok(Json(state.settings.get_all().await?))
}

pub async fn update_setting(
    State(state): State<SettingsAppState>,
    WithRejection(Path(key), _): WithRejection<Path<String>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateSettingRequest>, AppError>,
) -> AppResult<Json<UserSetting>> {
    Ok(Json(state.settings.update(&key, &request.value).await?))
}
