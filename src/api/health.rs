use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
pub struct PoolStatus {
    pub connections: u32,
    pub idle: usize,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database_pool: PoolStatus,
}

/// Liveness plus pool occupancy. Never queries, so it answers while the database is down.
pub async fn health_check(State(db): State<PgPool>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if db.is_closed() { "degraded" } else { "healthy" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        database_pool: PoolStatus {
            connections: db.size(),
            idle: db.num_idle(),
            closed: db.is_closed(),
        },
    })
}
