// src/models/landing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Landing {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Solutec - Ventanas")]
    pub name: String,
    #[schema(example = "ventanas")]
    pub slug: String,
    #[schema(example = "https://solutecalumini.com/ventanas")]
    pub url: Option<String>,
    pub description: Option<String>,

    // Exposta só nas rotas de administração
    #[schema(example = "lf_3f2a9c...")]
    pub api_key: String,

    pub active: bool,
    pub notify_email: bool,
    pub notify_push: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resumo sem a API Key, usado no detalhe do lead.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandingSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
}

impl From<Landing> for LandingSummary {
    fn from(landing: Landing) -> Self {
        Self {
            id: landing.id,
            name: landing.name,
            slug: landing.slug,
            url: landing.url,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandingWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub landing: Landing,
    pub lead_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLanding {
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub notify_email: bool,
    pub notify_push: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandingChanges {
    pub name: Option<String>,
    pub url: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}
