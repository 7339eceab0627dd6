use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

pub const PER_PAGE_WORKOUTS: &str = "per_page_workouts";
pub const PER_PAGE_SUMMARY_DAY: &str = "per_page_summary_day";
pub const PER_PAGE_SUMMARY_WEEK: &str = "per_page_summary_week";
pub const PER_PAGE_SUMMARY_MONTH: &str = "per_page_summary_month";
pub const PER_PAGE_SUMMARY_YEAR: &str = "per_page_summary_year";

/// Heart-rate zones as (setting key, display name, default floor in bpm),
/// hardest first.
pub const HR_ZONE_SETTINGS: [(&str, &str, i32); 5] = [
    ("HR_Very_hard", "Very hard", 166),
    ("HR_Hard", "Hard", 147),
    ("HR_Moderate", "Moderate", 129),
    ("HR_Light", "Light", 111),
    ("HR_Very_light", "Very light", 0),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSetting {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
}

/// Default page size for a `per_page_*` key.
pub fn default_per_page(key: &str) -> Option<i64> {
    match key {
        PER_PAGE_WORKOUTS => Some(20),
        PER_PAGE_SUMMARY_DAY => Some(14),
        PER_PAGE_SUMMARY_WEEK => Some(12),
        PER_PAGE_SUMMARY_MONTH => Some(12),
        PER_PAGE_SUMMARY_YEAR => Some(10),
        _ => None,
    }
}

/// Largest accepted page size.
pub const MAX_PER_PAGE: i64 = 1000;

/// Stored page size, or `None` when it is missing or outside
/// `1..=MAX_PER_PAGE`.
pub fn parse_per_page(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| (1..=MAX_PER_PAGE).contains(v))
}

/// Only known keys are writable. Page sizes must be integers in
/// `1..=MAX_PER_PAGE` and HR floors non-negative integers.
pub fn validate_setting(key: &str, value: &str) -> AppResult<()> {
    let trimmed = value.trim();

    if default_per_page(key).is_some() {
        return match parse_per_page(Some(trimmed)) {
            Some(_) => Ok(()),
            None => Err(AppError::validation(format!(
                "{} must be an integer between 1 and {}",
                key, MAX_PER_PAGE
            ))),
        };
    }

    if HR_ZONE_SETTINGS.iter().any(|(k, _, _)| *k == key) {
        return match trimmed.parse::<i32>() {
            Ok(bpm) if bpm >= 0 => Ok(()),
            _ => Err(AppError::validation(format!(
                "{} must be a non-negative integer",
                key
            ))),
        };
    }

    Err(AppError::validation(format!("Unknown setting '{}'", key)))
}

/// Lower bound of one heart-rate zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrZoneFloor {
    pub zone_name: &'static str,
    pub floor_bpm: i32,
}

/// Zone floors sorted from highest to lowest, read from settings with
/// defaults for anything missing or unparseable.
pub fn hr_zone_floors(settings: &HashMap<String, Option<String>>) -> Vec<HrZoneFloor> {
    let mut floors: Vec<HrZoneFloor> = HR_ZONE_SETTINGS
        .iter()
        .map(|(key, name, default)| HrZoneFloor {
            zone_name: *name,
            floor_bpm: settings
                .get(*key)
                .and_then(|v| v.as_deref())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(*default),
        })
        .collect();
    floors.sort_by(|a, b| b.floor_bpm.cmp(&a.floor_bpm));
    floors
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_per_page() {
        assert_eq!(parse_per_page(Some("12")), Some(12));
        assert_eq!(parse_per_page(Some("0")), None);
        assert_eq!(parse_per_page(Some("-3")), None);
        assert_eq!(parse_per_page(Some("1000")), Some(1000));
        assert_eq!(parse_per_page(Some("1001")), None);
        assert_eq!(parse_per_page(Some("9223372036854775807")), None);
        assert_eq!(parse_per_page(Some("abc")), None);
        assert_eq!(parse_per_page(None), None);
    }

    #[test]
    fn test_validate_setting() {
        assert_matches!(validate_setting(PER_PAGE_WORKOUTS, "25"), Ok(()));
        assert_matches!(validate_setting(PER_PAGE_WORKOUTS, "0"), Err(AppError::Validation(_)));
        assert_matches!(
            validate_setting(PER_PAGE_WORKOUTS, "9223372036854775807"),
            Err(AppError::Validation(_))
        );
        assert_matches!(validate_setting("HR_Hard", "150"), Ok(()));
        assert_matches!(validate_setting("HR_Hard", "300"), Ok(()));
        assert_matches!(validate_setting("HR_Hard", "-1"), Err(AppError::Validation(_)));
        assert_matches!(validate_setting("preferred_theme", "dark"), Err(AppError::Validation(_)));
    }

    #[test]
    fn test_hr_zone_floors_use_overrides_and_defaults() {
        let mut settings = HashMap::new();
        settings.insert("HR_Hard".to_string(), Some("150".to_string()));
        settings.insert("HR_Light".to_string(), Some("garbage".to_string()));

        let floors = hr_zone_floors(&settings);
        assert_eq!(floors.len(), 5);
        assert_eq!(floors[0].floor_bpm, 166);
        assert_eq!(floors[1], HrZoneFloor { zone_name: "Hard", floor_bpm: 150 });
        assert_eq!(floors[3], HrZoneFloor { zone_name: "Light", floor_bpm: 111 });
        assert_eq!(floors[4].floor_bpm, 0);
    }
}
