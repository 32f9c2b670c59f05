// src/models/settings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Linha da tabela chave/valor `settings`.
#[derive(Debug, Clone, FromRow)]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Configuração efetiva devolvida ao painel.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[schema(example = "10")]
    pub commission_rate: Decimal,

    #[schema(example = "EUR")]
    pub currency: String,

    // None quando a taxa vem do ambiente e não do banco
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(example = "12.5")]
    pub commission_rate: Decimal,
}
