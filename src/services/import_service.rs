use serde_json::Value;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::ingest::parser::{ParsedDescriptor, ParsedHrSample, ParsedHrZone, ParsedSample};
use crate::ingest::parse_export;
use crate::models::workout::WorkoutCreatedResponse;
use crate::services::workout_service::insert_workout;

/// Equipment every machine export is filed under.
pub const EXPORT_EQUIPMENT_NAME: &str = "SKILLROW";

/// Rows per multi-row INSERT. Keeps the bind count well under the
/// Postgres limit of 65535 parameters.
const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
}

impl ImportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stores an export document as a new workout with all of its samples.
    /// Everything is written in one transaction, so a failure leaves no
    /// partial workout behind.
    pub async fn import_export(
        &self,
        document: &Value,
        notes: Option<String>,
    ) -> AppResult<WorkoutCreatedResponse> {
        let parsed = parse_export(document)?;

        let mut tx = self.db.begin().await?;

        if let Some(workout_id) = find_by_cardio_log_id(&mut tx, &parsed.cardio_log_id).await? {
            warn!(
                "Workout with cardio log id {} already exists as {}",
                parsed.cardio_log_id, workout_id
            );
            return Err(AppError::DuplicateWorkout {
                cardio_log_id: parsed.cardio_log_id,
                workout_id,
            });
        }

        let equipment_type_id = find_or_create_equipment(&mut tx, EXPORT_EQUIPMENT_NAME).await?;
        let descriptor_ids = resolve_descriptors(&mut tx, &parsed.descriptors).await?;

        let new_workout = parsed.into_new_workout(equipment_type_id, notes);
        let workout = match insert_workout(&mut *tx, &new_workout).await {
            Ok(workout) => workout,
            Err(e) if is_unique_violation(&e) => {
                // Lost a race with a concurrent import of the same export
                drop(tx);
                let workout_id = find_by_cardio_log_id(&mut *self.db.acquire().await?, &parsed.cardio_log_id)
                    .await?
                    .ok_or(AppError::Database(e))?;
                return Err(AppError::DuplicateWorkout {
                    cardio_log_id: parsed.cardio_log_id,
                    workout_id,
                });
            }
            Err(e) => return Err(e.into()),
        };

        insert_samples(&mut tx, workout.workout_id, &parsed.samples, &descriptor_ids).await?;
        insert_hr_samples(&mut tx, workout.workout_id, &parsed.heart_rate_samples).await?;
        insert_hr_zones(&mut tx, workout.workout_id, &parsed.hr_zones).await?;

        tx.commit().await?;

        info!(
            "Imported workout {} from export {} ({} samples, {} HR samples, {} HR zones)",
            workout.workout_id,
            workout.cardio_log_id,
            parsed.samples.len(),
            parsed.heart_rate_samples.len(),
            parsed.hr_zones.len()
        );

        Ok(WorkoutCreatedResponse {
            workout,
            samples_stored: parsed.samples.len(),
            heart_rate_samples_stored: parsed.heart_rate_samples.len(),
            hr_zones_stored: parsed.hr_zones.len(),
            success: true,
        })
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}

async fn find_by_cardio_log_id(
    conn: &mut PgConnection,
    cardio_log_id: &str,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT workout_id FROM workouts WHERE cardio_log_id = $1")
        .bind(cardio_log_id)
        .fetch_optional(conn)
        .await
}

async fn find_or_create_equipment(conn: &mut PgConnection, name: &str) -> Result<i32, sqlx::Error> {
    sqlx::query("INSERT INTO equipment_types (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    sqlx::query_scalar("SELECT equipment_type_id FROM equipment_types WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await
}

/// Descriptor ids in the same order as `descriptors`. A missing unit is a
/// real NULL, so lookups compare with `IS NOT DISTINCT FROM`.
async fn resolve_descriptors(
    conn: &mut PgConnection,
    descriptors: &[ParsedDescriptor],
) -> Result<Vec<i32>, sqlx::Error> {
    let mut cache: HashMap<(&str, Option<&str>), i32> = HashMap::new();
    let mut ids = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let key = (descriptor.name.as_str(), descriptor.unit.as_deref());
        if let Some(id) = cache.get(&key) {
            ids.push(*id);
            continue;
        }

        let id = match find_descriptor(&mut *conn, key.0, key.1).await? {
            Some(id) => id,
            None => {
                // A concurrent import may create the same descriptor first
                sqlx::query(
                    r#"
                    INSERT INTO metric_descriptors (metric_name, unit_of_measure)
                    VALUES ($1, $2)
                    ON CONFLICT (metric_name, unit_of_measure) DO NOTHING
                    "#,
                )
                .bind(key.0)
                .bind(key.1)
                .execute(&mut *conn)
                .await?;

                find_descriptor(&mut *conn, key.0, key.1)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?
            }
        };

        cache.insert(key, id);
        ids.push(id);
    }

    Ok(ids)
}

async fn find_descriptor(
    conn: &mut PgConnection,
    name: &str,
    unit: Option<&str>,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT metric_descriptor_id FROM metric_descriptors
        WHERE metric_name = $1 AND unit_of_measure IS NOT DISTINCT FROM $2
        ORDER BY metric_descriptor_id
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(unit)
    .fetch_optional(conn)
    .await
}

async fn insert_samples(
    conn: &mut PgConnection,
    workout_id: i32,
    samples: &[ParsedSample],
    descriptor_ids: &[i32],
) -> Result<(), sqlx::Error> {
    for chunk in samples.chunks(INSERT_CHUNK_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO workout_samples (workout_id, metric_descriptor_id, time_offset_seconds, value) ",
        );
        builder.push_values(chunk, |mut row, sample| {
            row.push_bind(workout_id)
                .push_bind(descriptor_ids[sample.descriptor])
                .push_bind(sample.time_offset_seconds)
                .push_bind(sample.value);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn insert_hr_samples(
    conn: &mut PgConnection,
    workout_id: i32,
    samples: &[ParsedHrSample],
) -> Result<(), sqlx::Error> {
    for chunk in samples.chunks(INSERT_CHUNK_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO heart_rate_samples (workout_id, time_offset_seconds, heart_rate_bpm) ",
        );
        builder.push_values(chunk, |mut row, sample| {
            row.push_bind(workout_id)
                .push_bind(sample.time_offset_seconds)
                .push_bind(sample.heart_rate_bpm);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn insert_hr_zones(
    conn: &mut PgConnection,
    workout_id: i32,
    zones: &[ParsedHrZone],
) -> Result<(), sqlx::Error> {
    if zones.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO workout_hr_zones (workout_id, zone_name, color_hex, lower_bound_bpm, upper_bound_bpm, seconds_in_zone) ",
    );
    builder.push_values(zones, |mut row, zone| {
        row.push_bind(workout_id)
            .push_bind(&zone.zone_name)
            .push_bind(&zone.color_hex)
            .push_bind(zone.lower_bound_bpm)
            .push_bind(zone.upper_bound_bpm)
            .push_bind(zone.seconds_in_zone);
    });
    builder.build().execute(&mut *conn).await?;
    Ok(())
}
