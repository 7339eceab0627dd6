use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use axum_extra::extract::WithRejection;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::workout::{CreateEquipmentRequest, EquipmentType, UpdateEquipmentRequest};
use crate::services::EquipmentService;

#[derive(Clone)]
pub struct EquipmentAppState {
    pub equipment: EquipmentService,
}

pub fn equipment_routes(db: PgPool) -> Router {
    let shared_state = EquipmentAppState {
        equipment: EquipmentService::new(db),
    };

    Router::new()
        .route("/", get(list_equipment).post(create_equipment))
        .route("/:equipment_type_id", patch(update_equipment))
        .with_state(shared_state)
}

pub async fn list_equipment(
    State(state): State<EquipmentAppState>,
) -> AppResult<Json<Vec<EquipmentType>>> {
    Ok(Json(state.equipment.list().await?))
}

pub async fn create_equipment(
    State(state): State<EquipmentAppState>,
    WithRejection(Json(request), _): WithRejection<Json<CreateEquipmentRequest>, AppError>,
) -> AppResult<(StatusCode, Json<EquipmentType>)> {
    let equipment = state.equipment.create(request).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Include or exclude the equipment from totals and rankings
pub async fn update_equipment(
    State(state): State<EquipmentAppState>,
    WithRejection(Path(equipment_type_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateEquipmentRequest>, AppError>,
) -> AppResult<Json<EquipmentType>> {
    let equipment = state
        .equipment
        .set_include_in_totals(equipment_type_id, request.settings_include_in_totals)
        .await?;
    Ok(Json(equipment))
}
