// src/services/settings_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{
        SettingsRepository,
        settings_repo::{COMMISSION_RATE_KEY, CURRENCY_KEY},
    },
    models::settings::AppSettings,
    services::commission::CommissionRate,
};

const DEFAULT_CURRENCY: &str = "EUR";

/// Taxa gravada no banco. Valor inválido conta como ausente.
fn stored_rate(value: &str) -> Option<CommissionRate> {
    match value.parse::<CommissionRate>() {
        Ok(rate) => Some(rate),
        Err(_) => {
            tracing::warn!(value, "commission_rate inválido no banco, usando o valor do ambiente");
            None
        }
    }
}

/// Resolve a configuração efetiva: registro no banco, senão o valor do ambiente.
#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
    fallback_rate: CommissionRate,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository, fallback_rate: CommissionRate) -> Self {
        Self { repo, fallback_rate }
    }

    pub async fn commission_rate<'e, E>(&self, executor: E) -> Result<CommissionRate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = self.repo.get(executor, COMMISSION_RATE_KEY).await?;

        Ok(record
            .and_then(|r| stored_rate(&r.value))
            .unwrap_or(self.fallback_rate))
    }

    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<AppSettings, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let rate_record = self.repo.get(&mut *conn, COMMISSION_RATE_KEY).await?;
        let currency = self
            .repo
            .get(&mut *conn, CURRENCY_KEY)
            .await?
            .map(|r| r.value)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let (commission_rate, updated_at) = rate_record
            .and_then(|r| stored_rate(&r.value).map(|rate| (rate, Some(r.updated_at))))
            .unwrap_or((self.fallback_rate, None));

        Ok(AppSettings {
            commission_rate: commission_rate.percent(),
            currency,
            updated_at,
        })
    }

    pub async fn update_commission_rate<'e, E>(
        &self,
        executor: E,
        percent: Decimal,
    ) -> Result<AppSettings, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let rate = CommissionRate::new(percent)?;
        let mut tx = executor.begin().await?;

        let record = self
            .repo
            .put(&mut *tx, COMMISSION_RATE_KEY, &rate.to_string())
            .await?;
        let currency = self
            .repo
            .get(&mut *tx, CURRENCY_KEY)
            .await?
            .map(|r| r.value)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        tx.commit().await?;
        tracing::info!(rate = %rate, "Taxa de comissão atualizada");

        Ok(AppSettings {
            commission_rate: rate.percent(),
            currency,
            updated_at: Some(record.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stored_rate_reads_valid_percentages_only() {
        assert_eq!(stored_rate("12.5").map(CommissionRate::percent), Some(dec!(12.5)));
        assert_eq!(stored_rate("diez"), None);
        assert_eq!(stored_rate("150"), None);
    }
}
