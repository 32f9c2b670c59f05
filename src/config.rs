// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::i18n::I18nStore,
    db::{
        ActivityRepository, ExpenseRepository, LandingRepository, LeadRepository, ReportRepository,
        SettingsRepository,
    },
    services::{
        activity_service::ActivityService, bulk_service::BulkService, commission::CommissionRate,
        expense_service::ExpenseService, ingestion_service::IngestionService,
        landing_service::LandingService, lead_service::LeadService, pipeline_service::PipelineService,
        report_service::ReportService, settings_service::SettingsService,
    },
};

/// Configuração lida do ambiente uma única vez, na subida.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Taxa usada enquanto `settings` não tem `commission_rate` gravado.
    pub commission_rate: CommissionRate,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Vazio = qualquer origem.
    pub cors_allowed_origins: Vec<String>,
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} inválida ({raw}): {e}")),
        _ => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let rate_percent: Decimal = var_or("COMMISSION_RATE", Decimal::from(10))?;
        let commission_rate = CommissionRate::new(rate_percent)
            .map_err(|_| anyhow::anyhow!("COMMISSION_RATE deve estar entre 0 e 100"))?;

        let default_page_size: u32 = var_or("DEFAULT_PAGE_SIZE", 20)?;
        let max_page_size: u32 = var_or("MAX_PAGE_SIZE", 500)?;
        if default_page_size == 0 || max_page_size == 0 {
            anyhow::bail!("DEFAULT_PAGE_SIZE e MAX_PAGE_SIZE devem ser maiores que 0");
        }

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            bind_addr: var_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(var_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            commission_rate,
            default_page_size,
            max_page_size,
            cors_allowed_origins,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(self.db_acquire_timeout)
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
    pub i18n_store: I18nStore,

    pub lead_service: LeadService,
    pub pipeline_service: PipelineService,
    pub activity_service: ActivityService,
    pub ingestion_service: IngestionService,
    pub bulk_service: BulkService,
    pub landing_service: LandingService,
    pub expense_service: ExpenseService,
    pub report_service: ReportService,
    pub settings_service: SettingsService,
}

impl AppState {
    /// Monta o gráfico de dependências sobre um pool já aberto.
    pub fn new(db_pool: PgPool, config: AppConfig) -> Self {
        let lead_repo = LeadRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new();
        let landing_repo = LandingRepository::new();
        let expense_repo = ExpenseRepository::new(db_pool.clone());

        let settings_service = SettingsService::new(SettingsRepository::new(), config.commission_rate);
        let expense_service = ExpenseService::new(expense_repo);

        Self {
            lead_service: LeadService::new(
                lead_repo.clone(),
                activity_repo.clone(),
                landing_repo.clone(),
                settings_service.clone(),
            ),
            pipeline_service: PipelineService::new(
                lead_repo.clone(),
                activity_repo.clone(),
                settings_service.clone(),
            ),
            activity_service: ActivityService::new(lead_repo.clone(), activity_repo.clone()),
            ingestion_service: IngestionService::new(landing_repo.clone(), lead_repo.clone(), activity_repo),
            bulk_service: BulkService::new(lead_repo, settings_service.clone()),
            landing_service: LandingService::new(landing_repo),
            report_service: ReportService::new(ReportRepository::new(), expense_service.clone()),
            expense_service,
            settings_service,
            i18n_store: I18nStore::new(),
            db_pool,
            config,
        }
    }
}
