use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::format::{format_seconds_to_hms, format_split_short};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EquipmentType {
    pub equipment_type_id: i32,
    pub name: String,
    pub settings_include_in_totals: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub workout_id: i32,
    pub cardio_log_id: String, // Source id from the machine export, or manual_<uuid>
    pub equipment_type_id: Option<i32>,
    pub workout_name: Option<String>,
    pub workout_date: NaiveDate,
    pub target_description: Option<String>,
    pub duration_seconds: Option<f64>,
    pub total_distance_meters: Option<f64>,
    pub average_split_seconds_500m: Option<f64>,
    pub total_isoreps: Option<f64>,
    pub notes: Option<String>,
    pub level: Option<f64>, // Time-weighted resistance level
}

impl Workout {
    pub fn split_display(&self) -> String {
        format_split_short(self.average_split_seconds_500m)
    }

    pub fn duration_display(&self) -> String {
        format_seconds_to_hms(self.duration_seconds)
    }
}

/// A workout joined with its equipment name, as listed in the API.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub workout: Workout,
    pub equipment_name: Option<String>,
    #[sqlx(skip)]
    pub split_display: String,
    #[sqlx(skip)]
    pub duration_display: String,
}

impl WorkoutListItem {
    /// Fills the display fields after loading from the database.
    pub fn with_display(mut self) -> Self {
        self.split_display = self.workout.split_display();
        self.duration_display = self.workout.duration_display();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MetricDescriptor {
    pub metric_descriptor_id: i32,
    pub metric_name: String,
    pub unit_of_measure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSample {
    pub sample_id: i64,
    pub workout_id: i32,
    pub metric_descriptor_id: i32,
    pub time_offset_seconds: i32,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HeartRateSample {
    pub hr_sample_id: i64,
    pub workout_id: i32,
    pub time_offset_seconds: i32,
    pub heart_rate_bpm: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutHrZone {
    pub workout_hr_zone_id: i32,
    pub workout_id: i32,
    pub zone_name: String,
    pub color_hex: Option<String>,
    pub lower_bound_bpm: Option<f64>,
    pub upper_bound_bpm: Option<f64>,
    pub seconds_in_zone: f64,
}

/// Manual entry as submitted by the client. Everything is optional here so
/// missing fields surface as validation messages instead of decode errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateManualWorkoutRequest {
    pub workout_name: Option<String>,
    pub workout_date: Option<String>,
    /// `H:M:S.f`, `M:S.f` or `S.f`
    pub workout_time: Option<String>,
    pub distance_meters: Option<f64>,
    pub level: Option<f64>,
    pub notes: Option<String>,
    pub equipment_type_id: Option<i32>,
}

/// Validated workout row ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub cardio_log_id: String,
    pub equipment_type_id: Option<i32>,
    pub workout_name: Option<String>,
    pub workout_date: NaiveDate,
    pub target_description: Option<String>,
    pub duration_seconds: Option<f64>,
    pub total_distance_meters: Option<f64>,
    pub average_split_seconds_500m: Option<f64>,
    pub total_isoreps: Option<f64>,
    pub notes: Option<String>,
    pub level: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitJsonWorkoutRequest {
    /// The export document, either inline or as a JSON-encoded string.
    pub json_data: Option<Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutCreatedResponse {
    pub workout: Workout,
    pub samples_stored: usize,
    pub heart_rate_samples_stored: usize,
    pub hr_zones_stored: usize,
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEquipmentRequest {
    pub name: String,
    pub settings_include_in_totals: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEquipmentRequest {
    pub settings_include_in_totals: bool,
}

/// Split per 500 m from duration and distance.
pub fn split_per_500m(duration_seconds: f64, distance_meters: f64) -> Option<f64> {
    if distance_meters > 0.0 && duration_seconds > 0.0 {
        Some(duration_seconds / distance_meters * 500.0)
    } else {
        None
    }
}

/// Blank notes are stored as NULL.
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_per_500m() {
        assert_eq!(split_per_500m(480.0, 2000.0), Some(120.0));
        assert_eq!(split_per_500m(480.0, 0.0), None);
        assert_eq!(split_per_500m(0.0, 2000.0), None);
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes(Some("  ".to_string())), None);
        assert_eq!(normalize_notes(None), None);
        assert_eq!(
            normalize_notes(Some("easy row".to_string())),
            Some("easy row".to_string())
        );
    }
}
