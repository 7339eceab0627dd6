use chrono::{Duration, NaiveDate, Weekday};

use crate::error::{AppError, AppResult};
use crate::models::workout::{normalize_notes, split_per_500m, CreateManualWorkoutRequest, NewWorkout};

/// Default name for manual entries submitted without one.
pub const DEFAULT_MANUAL_WORKOUT_NAME: &str = "Rowing";

/// Parses `H:M:S.f`, `M:S.f` or `S.f` into seconds. Hours and minutes must
/// be whole numbers.
pub fn parse_duration_to_seconds(time_str: &str) -> Option<f64> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return None;
    }

    let parts: Vec<&str> = time_str.split(':').collect();
    let seconds = match parts.as_slice() {
        [h, m, s] => {
            let h: i64 = h.trim().parse().ok()?;
            let m: i64 = m.trim().parse().ok()?;
            let s: f64 = s.trim().parse().ok()?;
            h.checked_mul(3600)?.checked_add(m.checked_mul(60)?)? as f64 + s
        }
        [m, s] => {
            let m: i64 = m.trim().parse().ok()?;
            let s: f64 = s.trim().parse().ok()?;
            m.checked_mul(60)? as f64 + s
        }
        [s] => s.parse().ok()?,
        _ => return None,
    };

    seconds.is_finite().then_some(seconds)
}

/// Date in the machine export format, `DD/MM/YYYY`.
pub fn parse_export_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").ok()
}

pub fn parse_iso_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!("Invalid date format: {}. Expected YYYY-MM-DD.", value))
    })
}

/// Parses an ISO week key (`2023-W35`) into its Monday and Sunday.
pub fn parse_week_key(value: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || {
        AppError::validation(format!(
            "Invalid week format: {}. Expected YYYY-Www (e.g., 2023-W35).",
            value
        ))
    };

    let (year, week) = value.trim().split_once("-W").ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let week: u32 = week.parse().map_err(|_| invalid())?;
    if !(1..=53).contains(&week) {
        return Err(invalid());
    }

    let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)?;
    Ok((start, start + Duration::days(6)))
}

/// Parses `YYYY-MM` into (year, month).
pub fn parse_month_key(value: &str) -> AppResult<(i32, u32)> {
    let invalid = || {
        AppError::validation(format!(
            "Invalid month format: {}. Expected YYYY-MM.",
            value
        ))
    };

    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(invalid());
    }

    Ok((year, month))
}

pub fn validate_year(year: i32) -> AppResult<i32> {
    if (1900..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(AppError::validation(format!("Invalid year: {}", year)))
    }
}

/// Checks a manual entry and derives its split. Equipment existence is
/// checked by the caller against the database.
pub fn validate_manual_workout(
    request: CreateManualWorkoutRequest,
    cardio_log_id: String,
) -> AppResult<NewWorkout> {
    let (date_str, time_str, distance, equipment_type_id) = match (
        request.workout_date.as_deref().filter(|s| !s.trim().is_empty()),
        request.workout_time.as_deref().filter(|s| !s.trim().is_empty()),
        request.distance_meters,
        request.equipment_type_id,
    ) {
        (Some(d), Some(t), Some(m), Some(e)) => (d, t, m, e),
        _ => {
            return Err(AppError::validation(
                "Date, Time, Distance, and Equipment are required fields.",
            ))
        }
    };

    let workout_date = parse_iso_date(date_str)?;

    let duration_seconds = parse_duration_to_seconds(time_str)
        .filter(|s| *s > 0.0)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Invalid time format: {}. Use HH:MM:SS.ms, MM:SS.ms, or S.ms.",
                time_str
            ))
        })?;

    if !distance.is_finite() || distance <= 0.0 {
        return Err(AppError::validation("Distance must be a positive number."));
    }

    if let Some(level) = request.level {
        if !level.is_finite() || level < 0.0 {
            return Err(AppError::validation("Level must be a non-negative number."));
        }
    }

    let workout_name = request
        .workout_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MANUAL_WORKOUT_NAME.to_string());

    Ok(NewWorkout {
        cardio_log_id,
        equipment_type_id: Some(equipment_type_id),
        workout_name: Some(workout_name),
        workout_date,
        target_description: None,
        duration_seconds: Some(duration_seconds),
        total_distance_meters: Some(distance),
        average_split_seconds_500m: split_per_500m(duration_seconds, distance),
        total_isoreps: None,
        notes: normalize_notes(request.notes),
        level: request.level,
    })
}
