use axum::{extract::DefaultBodyLimit, routing::get, Router};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::equipment::equipment_routes;
use super::health::health_check;
use super::home::home_routes;
use super::periods::periods_routes;
use super::rankings::rankings_routes;
use super::settings::settings_routes;
use super::summaries::summaries_routes;
use super::workouts::workouts_routes;
use crate::config::AppConfig;

pub fn create_routes(db: PgPool, config: &AppConfig) -> Router {
    let api_v1 = Router::new()
        .nest("/home", home_routes(db.clone()))
        .nest("/workouts", workouts_routes(db.clone()))
        .nest("/equipment", equipment_routes(db.clone()))
        .nest("/summaries", summaries_routes(db.clone()))
        .nest("/periods", periods_routes(db.clone()))
        .nest("/rankings", rankings_routes(db.clone()))
        .nest("/settings", settings_routes(db.clone()));

    let health = Router::new()
        .route("/health", get(health_check))
        .with_state(db);

    Router::new()
        .merge(health)
        .nest("/api/v1", api_v1)
        // Export uploads are bounded by MAX_CONTENT_LENGTH, not axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_content_length))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
