// src/db/settings_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::settings::SettingRecord};

pub const COMMISSION_RATE_KEY: &str = "commission_rate";
pub const CURRENCY_KEY: &str = "currency";

/// Tabela chave/valor de configuração global.
#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get<'e, E>(&self, executor: E, key: &str) -> Result<Option<SettingRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, SettingRecord>(
            "SELECT key, value, description, updated_at FROM settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    // UPSERT (Insert or Update)
    pub async fn put<'e, E>(&self, executor: E, key: &str, value: &str) -> Result<SettingRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, SettingRecord>(
            r#"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, description, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }
}
