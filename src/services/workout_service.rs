use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::pagination::{clamp_page, page_offset, Page};
use crate::models::settings::PER_PAGE_WORKOUTS;
use crate::models::validation::validate_manual_workout;
use crate::models::workout::{
    normalize_notes, CreateManualWorkoutRequest, NewWorkout, Workout, WorkoutListItem,
};
use crate::services::settings_service::SettingsService;

/// Workouts on the home page.
pub const LATEST_WORKOUTS: i64 = 5;

const WORKOUT_COLUMNS: &str = "workout_id, cardio_log_id, equipment_type_id, workout_name, \
    workout_date, target_description, duration_seconds, total_distance_meters, \
    average_split_seconds_500m, total_isoreps, notes, level";

const LIST_SELECT: &str = r#"
    SELECT
        w.workout_id, w.cardio_log_id, w.equipment_type_id, w.workout_name,
        w.workout_date, w.target_description, w.duration_seconds,
        w.total_distance_meters, w.average_split_seconds_500m, w.total_isoreps,
        w.notes, w.level,
        et.name AS equipment_name
    FROM workouts w
    LEFT JOIN equipment_types et ON et.equipment_type_id = w.equipment_type_id
"#;

/// Inserts a workout row. Takes any executor so imports can run it inside
/// their transaction.
pub async fn insert_workout<'e, E>(executor: E, workout: &NewWorkout) -> Result<Workout, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO workouts (
            cardio_log_id, equipment_type_id, workout_name, workout_date,
            target_description, duration_seconds, total_distance_meters,
            average_split_seconds_500m, total_isoreps, notes, level
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {}
        "#,
        WORKOUT_COLUMNS
    );

    sqlx::query_as::<_, Workout>(&sql)
        .bind(&workout.cardio_log_id)
        .bind(workout.equipment_type_id)
        .bind(&workout.workout_name)
        .bind(workout.workout_date)
        .bind(&workout.target_description)
        .bind(workout.duration_seconds)
        .bind(workout.total_distance_meters)
        .bind(workout.average_split_seconds_500m)
        .bind(workout.total_isoreps)
        .bind(&workout.notes)
        .bind(workout.level)
        .fetch_one(executor)
        .await
}

#[derive(Clone)]
pub struct WorkoutService {
    db: PgPool,
    settings: SettingsService,
}

impl WorkoutService {
    pub fn new(db: PgPool) -> Self {
        Self {
            settings: SettingsService::new(db.clone()),
            db,
        }
    }

    pub async fn latest(&self, limit: i64) -> AppResult<Vec<WorkoutListItem>> {
        let sql = format!(
            "{} ORDER BY w.workout_date DESC, w.workout_id DESC LIMIT $1",
            LIST_SELECT
        );
        let items = sqlx::query_as::<_, WorkoutListItem>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(items.into_iter().map(WorkoutListItem::with_display).collect())
    }

    pub async fn list_paginated(&self, page: Option<i64>) -> AppResult<Page<WorkoutListItem>> {
        let per_page = self.settings.get_per_page(PER_PAGE_WORKOUTS).await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
            .fetch_one(&self.db)
            .await?;
        let page = clamp_page(page, total, per_page);

        let sql = format!(
            "{} ORDER BY w.workout_date DESC, w.workout_id DESC LIMIT $1 OFFSET $2",
            LIST_SELECT
        );
        let items = sqlx::query_as::<_, WorkoutListItem>(&sql)
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(&self.db)
            .await?;

        Ok(Page::new(page, per_page, total, items).map(WorkoutListItem::with_display))
    }

    /// Workouts dated within `[start, end]`, newest first.
    pub async fn list_between(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<WorkoutListItem>> {
        let sql = format!(
            "{} WHERE w.workout_date BETWEEN $1 AND $2 ORDER BY w.workout_date DESC, w.workout_id DESC",
            LIST_SELECT
        );
        let items = sqlx::query_as::<_, WorkoutListItem>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;

        Ok(items.into_iter().map(WorkoutListItem::with_display).collect())
    }

    pub async fn get(&self, workout_id: i32) -> AppResult<WorkoutListItem> {
        let sql = format!("{} WHERE w.workout_id = $1", LIST_SELECT);
        sqlx::query_as::<_, WorkoutListItem>(&sql)
            .bind(workout_id)
            .fetch_optional(&self.db)
            .await?
            .map(WorkoutListItem::with_display)
            .ok_or_else(|| AppError::not_found(format!("Workout {}", workout_id)))
    }

    pub async fn create_manual(&self, request: CreateManualWorkoutRequest) -> AppResult<Workout> {
        let cardio_log_id = format!("manual_{}", Uuid::new_v4());
        let new_workout = validate_manual_workout(request, cardio_log_id)?;

        if let Some(equipment_type_id) = new_workout.equipment_type_id {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM equipment_types WHERE equipment_type_id = $1)",
            )
            .bind(equipment_type_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::validation(format!(
                    "Equipment type {} does not exist",
                    equipment_type_id
                )));
            }
        }

        let workout = insert_workout(&self.db, &new_workout).await?;
        info!(
            "Created manual workout {} ({})",
            workout.workout_id, workout.cardio_log_id
        );
        Ok(workout)
    }

    /// Removes the workout. Samples, HR samples and zones go with it.
    pub async fn delete(&self, workout_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM workouts WHERE workout_id = $1")
            .bind(workout_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Workout {}", workout_id)));
        }

        info!("Deleted workout {}", workout_id);
        Ok(())
    }

    pub async fn update_notes(&self, workout_id: i32, notes: Option<String>) -> AppResult<Workout> {
        let sql = format!(
            "UPDATE workouts SET notes = $2 WHERE workout_id = $1 RETURNING {}",
            WORKOUT_COLUMNS
        );
        sqlx::query_as::<_, Workout>(&sql)
            .bind(workout_id)
            .bind(normalize_notes(notes))
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Workout {}", workout_id)))
    }
}
