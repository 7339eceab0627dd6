use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};
use crate::format::{format_duration_ms, format_split_short};

/// How many places each ranking board shows.
pub const RANKING_BOARD_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingType {
    /// Fixed distance, ranked by fastest time
    Distance,
    /// Fixed time, ranked by longest distance
    Time,
}

impl RankingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingType::Distance => "distance",
            RankingType::Time => "time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "distance" => Some(RankingType::Distance),
            "time" => Some(RankingType::Time),
            _ => None,
        }
    }
}

/// Partition of the ranking view a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankScope {
    Overall,
    Year,
    Month,
}

impl RankScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankScope::Overall => "overall",
            RankScope::Year => "year",
            RankScope::Month => "month",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RankingSetting {
    pub ranking_id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub ranking_type: String,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RankingEntry {
    pub id: i64,
    pub ranking_id: i32,
    pub workout_id: i32,
    pub rank: i64,
    pub workout_date: NaiveDate,
    pub total_distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub average_split_seconds_500m: Option<f64>,
    #[sqlx(skip)]
    pub result_display: String,
}

impl RankingEntry {
    /// Distance boards show the time taken, time boards the meters covered.
    pub fn with_display(mut self, ranking_type: RankingType) -> Self {
        self.result_display = match ranking_type {
            RankingType::Distance => format_duration_ms(self.duration_seconds),
            RankingType::Time => match self.total_distance_meters {
                Some(m) => format!("{:.0}m ({})", m, format_split_short(self.average_split_seconds_500m)),
                None => "N/A".to_string(),
            },
        };
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingBoard {
    pub ranking_id: i32,
    #[serde(rename = "type")]
    pub ranking_type: String,
    pub label: String,
    pub value: f64,
    pub rankings: Vec<RankingEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingsResponse {
    pub title: String,
    pub selected_year: Option<i32>,
    pub available_years: Vec<i32>,
    pub boards: Vec<RankingBoard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRankingSettingRequest {
    #[serde(rename = "type")]
    pub ranking_type: String,
    pub value: f64,
    pub label: String,
}

impl CreateRankingSettingRequest {
    pub fn validate(&self) -> AppResult<RankingType> {
        let ranking_type = RankingType::parse(&self.ranking_type).ok_or_else(|| {
            AppError::validation("Ranking type must be 'distance' or 'time'")
        })?;

        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(AppError::validation("Ranking value must be a positive number"));
        }

        if self.label.trim().is_empty() {
            return Err(AppError::validation("Ranking label cannot be empty"));
        }

        Ok(ranking_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(ranking_type: &str, value: f64, label: &str) -> CreateRankingSettingRequest {
        CreateRankingSettingRequest {
            ranking_type: ranking_type.to_string(),
            value,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert_matches!(request("distance", 2000.0, "2K").validate(), Ok(RankingType::Distance));
        assert_matches!(request("time", 1800.0, "30 min").validate(), Ok(RankingType::Time));
        assert_matches!(request("pace", 2000.0, "2K").validate(), Err(AppError::Validation(_)));
        assert_matches!(request("distance", 0.0, "2K").validate(), Err(AppError::Validation(_)));
        assert_matches!(request("distance", 2000.0, "  ").validate(), Err(AppError::Validation(_)));
    }

    #[test]
    fn test_entry_display_by_type() {
        let entry = RankingEntry {
            id: 1,
            ranking_id: 1,
            workout_id: 9,
            rank: 1,
            workout_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            total_distance_meters: Some(2000.0),
            duration_seconds: Some(455.25),
            average_split_seconds_500m: Some(113.8125),
            result_display: String::new(),
        };

        assert_eq!(entry.clone().with_display(RankingType::Distance).result_display, "7:35.25");
        assert_eq!(
            entry.with_display(RankingType::Time).result_display,
            "2000m (1:53.8)"
        );
    }

    #[test]
    fn test_scope_names_match_view() {
        assert_eq!(RankScope::Overall.as_str(), "overall");
        assert_eq!(RankScope::Year.as_str(), "year");
        assert_eq!(RankScope::Month.as_str(), "month");
    }
}
