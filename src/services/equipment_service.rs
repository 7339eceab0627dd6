use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::workout::{CreateEquipmentRequest, EquipmentType};

#[derive(Clone)]
pub struct EquipmentService {
    db: PgPool,
}

impl EquipmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<EquipmentType>> {
        let equipment = sqlx::query_as::<_, EquipmentType>(
            "SELECT equipment_type_id, name, settings_include_in_totals FROM equipment_types ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(equipment)
    }

    pub async fn create(&self, request: CreateEquipmentRequest) -> AppResult<EquipmentType> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Equipment name cannot be empty"));
        }

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM equipment_types WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.db)
                .await?;
        if taken {
            return Err(AppError::validation(format!(
                "Equipment '{}' already exists",
                name
            )));
        }

        let equipment = sqlx::query_as::<_, EquipmentType>(
            r#"
            INSERT INTO equipment_types (name, settings_include_in_totals)
            VALUES ($1, $2)
            RETURNING equipment_type_id, name, settings_include_in_totals
            "#,
        )
        .bind(name)
        .bind(request.settings_include_in_totals.unwrap_or(true))
        .fetch_one(&self.db)
        .await?;

        info!("Created equipment '{}'", equipment.name);
        Ok(equipment)
    }

    /// Toggles whether the equipment's workouts count toward totals and
    /// rankings. The views refresh through their triggers.
    pub async fn set_include_in_totals(
        &self,
        equipment_type_id: i32,
        include: bool,
    ) -> AppResult<EquipmentType> {
        let equipment = sqlx::query_as::<_, EquipmentType>(
            r#"
            UPDATE equipment_types
            SET settings_include_in_totals = $2
            WHERE equipment_type_id = $1
            RETURNING equipment_type_id, name, settings_include_in_totals
            "#,
        )
        .bind(equipment_type_id)
        .bind(include)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Equipment {}", equipment_type_id)))?;

        info!(
            "Equipment '{}' include_in_totals = {}",
            equipment.name, equipment.settings_include_in_totals
        );
        Ok(equipment)
    }
}
