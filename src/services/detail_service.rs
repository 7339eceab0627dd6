use sqlx::PgPool;
use tracing::debug;

use crate::error::AppResult;
use crate::models::detail::{
    build_charts, derive_hr_zones, time_categories, ChartMetric, HrZoneTime, MetricSeries,
    WorkoutDetail, WorkoutHrDetail, TIME_AXIS_METRIC,
};
use crate::models::workout::{HeartRateSample, MetricDescriptor, WorkoutHrZone};
use crate::services::settings_service::SettingsService;
use crate::services::workout_service::WorkoutService;

#[derive(Clone)]
pub struct DetailService {
    db: PgPool,
    workouts: WorkoutService,
    settings: SettingsService,
}

impl DetailService {
    pub fn new(db: PgPool) -> Self {
        Self {
            workouts: WorkoutService::new(db.clone()),
            settings: SettingsService::new(db.clone()),
            db,
        }
    }

    /// Descriptor registered under `name`, whatever its unit. One that has
    /// samples for the workout wins, then the oldest.
    async fn descriptor(&self, workout_id: i32, name: &str) -> AppResult<Option<MetricDescriptor>> {
        let descriptor = sqlx::query_as::<_, MetricDescriptor>(
            r#"
            SELECT d.metric_descriptor_id, d.metric_name, d.unit_of_measure
            FROM metric_descriptors d
            WHERE d.metric_name = $1
            ORDER BY EXISTS (
                         SELECT 1 FROM workout_samples s
                         WHERE s.workout_id = $2
                           AND s.metric_descriptor_id = d.metric_descriptor_id
                     ) DESC,
                     d.metric_descriptor_id
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(workout_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(descriptor)
    }

    async fn samples(&self, workout_id: i32, descriptor_id: i32) -> AppResult<Vec<(i32, f64)>> {
        let samples = sqlx::query_as::<_, (i32, f64)>(
            r#"
            SELECT time_offset_seconds, value
            FROM workout_samples
            WHERE workout_id = $1 AND metric_descriptor_id = $2
            ORDER BY time_offset_seconds, sample_id
            "#,
        )
        .bind(workout_id)
        .bind(descriptor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(samples)
    }

    async fn charts_series(&self, workout_id: i32) -> AppResult<(Vec<i32>, Vec<MetricSeries>)> {
        let Some(axis) = self.descriptor(workout_id, TIME_AXIS_METRIC).await? else {
            debug!("No '{}' descriptor, workout {} has no charts", TIME_AXIS_METRIC, workout_id);
            return Ok((Vec::new(), Vec::new()));
        };

        let categories = time_categories(
            self.samples(workout_id, axis.metric_descriptor_id)
                .await?
                .into_iter()
                .map(|(t, _)| t),
        );
        if categories.is_empty() {
            return Ok((categories, Vec::new()));
        }

        let mut series = Vec::new();
        for metric in ChartMetric::ALL {
            if let Some(descriptor) = self.descriptor(workout_id, metric.descriptor_name()).await? {
                series.push(MetricSeries {
                    metric,
                    samples: self.samples(workout_id, descriptor.metric_descriptor_id).await?,
                    unit: descriptor.unit_of_measure,
                });
            }
        }

        Ok((categories, series))
    }

    async fn heart_rate(&self, workout_id: i32) -> AppResult<WorkoutHrDetail> {
        let samples = sqlx::query_as::<_, HeartRateSample>(
            r#"
            SELECT hr_sample_id, workout_id, time_offset_seconds, heart_rate_bpm
            FROM heart_rate_samples
            WHERE workout_id = $1
            ORDER BY time_offset_seconds, hr_sample_id
            "#,
        )
        .bind(workout_id)
        .fetch_all(&self.db)
        .await?;

        let stored = sqlx::query_as::<_, WorkoutHrZone>(
            r#"
            SELECT workout_hr_zone_id, workout_id, zone_name, color_hex,
                   lower_bound_bpm, upper_bound_bpm, seconds_in_zone
            FROM workout_hr_zones
            WHERE workout_id = $1
            ORDER BY workout_hr_zone_id
            "#,
        )
        .bind(workout_id)
        .fetch_all(&self.db)
        .await?;

        if !stored.is_empty() || samples.is_empty() {
            return Ok(WorkoutHrDetail {
                samples,
                zones: stored.into_iter().map(HrZoneTime::from).collect(),
                zones_derived: false,
            });
        }

        let floors = self.settings.hr_zone_floors().await?;
        let zones = derive_hr_zones(&samples, &floors);
        Ok(WorkoutHrDetail {
            zones_derived: !zones.is_empty(),
            samples,
            zones,
        })
    }

    pub async fn detail(&self, workout_id: i32) -> AppResult<WorkoutDetail> {
        let workout = self.workouts.get(workout_id).await?;
        let (categories, series) = self.charts_series(workout_id).await?;
        let charts = build_charts(
            &categories,
            &series,
            workout.workout.average_split_seconds_500m,
        );

        Ok(WorkoutDetail {
            workout,
            charts,
            heart_rate: self.heart_rate(workout_id).await?,
        })
    }
}
