use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::ranking::{
    CreateRankingSettingRequest, RankScope, RankingBoard, RankingEntry, RankingSetting,
    RankingType, RankingsResponse, RANKING_BOARD_LIMIT,
};
use crate::models::validation::validate_year;

const ENTRY_SELECT: &str = r#"
    SELECT
        r.id, r.ranking_id, r.workout_id, r.rank,
        w.workout_date, w.total_distance_meters, w.duration_seconds,
        w.average_split_seconds_500m
    FROM mv_workout_rankings r
    JOIN workouts w ON w.workout_id = r.workout_id
    WHERE r.ranking_id = $1 AND r.rank_type = $2
"#;

#[derive(Clone)]
pub struct RankingService {
    db: PgPool,
}

impl RankingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Settings in the order they were created.
    pub async fn list_settings(&self) -> AppResult<Vec<RankingSetting>> {
        let settings = sqlx::query_as::<_, RankingSetting>(
            "SELECT ranking_id, type, value, label FROM ranking_settings ORDER BY ranking_id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(settings)
    }

    pub async fn get_setting(&self, ranking_id: i32) -> AppResult<RankingSetting> {
        sqlx::query_as::<_, RankingSetting>(
            "SELECT ranking_id, type, value, label FROM ranking_settings WHERE ranking_id = $1",
        )
        .bind(ranking_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Ranking {}", ranking_id)))
    }

    pub async fn create_setting(
        &self,
        request: CreateRankingSettingRequest,
    ) -> AppResult<RankingSetting> {
        let ranking_type = request.validate()?;

        let setting = sqlx::query_as::<_, RankingSetting>(
            r#"
            INSERT INTO ranking_settings (type, value, label)
            VALUES ($1, $2, $3)
            RETURNING ranking_id, type, value, label
            "#,
        )
        .bind(ranking_type.as_str())
        .bind(request.value)
        .bind(request.label.trim())
        .fetch_one(&self.db)
        .await?;

        info!(
            "Created {} ranking '{}' at {}",
            setting.ranking_type, setting.label, setting.value
        );
        Ok(setting)
    }

    pub async fn delete_setting(&self, ranking_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ranking_settings WHERE ranking_id = $1")
            .bind(ranking_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Ranking {}", ranking_id)));
        }

        info!("Deleted ranking {}", ranking_id);
        Ok(())
    }

    pub async fn available_years(&self) -> AppResult<Vec<i32>> {
        let years: Vec<i32> = sqlx::query_scalar(
            "SELECT DISTINCT year FROM mv_workout_rankings WHERE year IS NOT NULL ORDER BY year DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(years)
    }

    async fn entries(
        &self,
        setting: &RankingSetting,
        scope: RankScope,
        year: Option<i32>,
        month: Option<u32>,
    ) -> AppResult<Vec<RankingEntry>> {
        let mut sql = ENTRY_SELECT.to_string();
        let mut next_param = 3;
        if year.is_some() {
            sql.push_str(&format!(" AND r.year = ${}", next_param));
            next_param += 1;
        }
        if month.is_some() {
            sql.push_str(&format!(" AND r.month = ${}", next_param));
            next_param += 1;
        }
        sql.push_str(&format!(" ORDER BY r.rank LIMIT ${}", next_param));

        let mut query = sqlx::query_as::<_, RankingEntry>(&sql)
            .bind(setting.ranking_id)
            .bind(scope.as_str());
        if let Some(year) = year {
            query = query.bind(year);
        }
        if let Some(month) = month {
            query = query.bind(month as i32);
        }
        let entries = query.bind(RANKING_BOARD_LIMIT).fetch_all(&self.db).await?;

        let ranking_type = match RankingType::parse(&setting.ranking_type) {
            Some(ranking_type) => ranking_type,
            None => {
                warn!(
                    "Ranking {} has unknown type '{}'",
                    setting.ranking_id, setting.ranking_type
                );
                RankingType::Distance
            }
        };

        Ok(entries
            .into_iter()
            .map(|entry| entry.with_display(ranking_type))
            .collect())
    }

    fn board(setting: RankingSetting, rankings: Vec<RankingEntry>) -> RankingBoard {
        RankingBoard {
            ranking_id: setting.ranking_id,
            ranking_type: setting.ranking_type,
            label: setting.label,
            value: setting.value,
            rankings,
        }
    }

    /// Top workouts for every configured ranking, all time or for one year.
    pub async fn boards(&self, year: Option<i32>) -> AppResult<RankingsResponse> {
        let year = year.map(validate_year).transpose()?;
        let scope = if year.is_some() {
            RankScope::Year
        } else {
            RankScope::Overall
        };

        let mut boards = Vec::new();
        for setting in self.list_settings().await? {
            let rankings = self.entries(&setting, scope, year, None).await?;
            boards.push(Self::board(setting, rankings));
        }

        Ok(RankingsResponse {
            title: match year {
                Some(year) => format!("Athlete Rankings {}", year),
                None => "Athlete Rankings".to_string(),
            },
            selected_year: year,
            available_years: self.available_years().await?,
            boards,
        })
    }

    pub async fn month_board(&self, ranking_id: i32, year: i32, month: u32) -> AppResult<RankingBoard> {
        let setting = self.get_setting(ranking_id).await?;
        let rankings = self
            .entries(&setting, RankScope::Month, Some(year), Some(month))
            .await?;

        Ok(Self::board(setting, rankings))
    }
}
