use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::settings::{
    default_per_page, hr_zone_floors, parse_per_page, validate_setting, HrZoneFloor, UserSetting,
};

#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
}

impl SettingsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_all(&self) -> AppResult<Vec<UserSetting>> {
        let settings = sqlx::query_as::<_, UserSetting>(
            "SELECT key, value FROM user_settings ORDER BY key",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(settings)
    }

    pub async fn get_map(&self) -> AppResult<HashMap<String, Option<String>>> {
        let settings = self.get_all().await?;
        Ok(settings.into_iter().map(|s| (s.key, s.value)).collect())
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM user_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.db)
                .await?;

        Ok(value.flatten())
    }

    /// Page size stored under `key`. Missing or invalid values fall back to
    /// the built-in default.
    pub async fn get_per_page(&self, key: &str) -> AppResult<i64> {
        let default = default_per_page(key).unwrap_or(10);
        let stored = self.get(key).await?;

        match parse_per_page(stored.as_deref()) {
            Some(per_page) => Ok(per_page),
            None => {
                if stored.is_some() {
                    warn!(
                        "Invalid value {:?} for setting '{}', using default {}",
                        stored, key, default
                    );
                }
                Ok(default)
            }
        }
    }

    pub async fn hr_zone_floors(&self) -> AppResult<Vec<HrZoneFloor>> {
        Ok(hr_zone_floors(&self.get_map().await?))
    }

    pub async fn update(&self, key: &str, value: &str) -> AppResult<UserSetting> {
        validate_setting(key, value)?;

        let setting = sqlx::query_as::<_, UserSetting>(
            r#"
            INSERT INTO user_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            RETURNING key, value
            "#,
        )
        .bind(key)
        .bind(value.trim())
        .fetch_one(&self.db)
        .await?;

        info!("Setting '{}' updated to {:?}", setting.key, setting.value);
        Ok(setting)
    }
}
