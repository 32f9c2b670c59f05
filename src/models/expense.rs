// src/models/expense.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "expense_kind")]
pub enum ExpenseKind {
    #[sqlx(rename = "anuncios")]
    #[serde(rename = "anuncios")]
    Ads,
    #[sqlx(rename = "desplazamiento")]
    #[serde(rename = "desplazamiento")]
    Travel,
    #[sqlx(rename = "material")]
    #[serde(rename = "material")]
    Materials,
    #[sqlx(rename = "comision_plataforma")]
    #[serde(rename = "comision_plataforma")]
    PlatformFee,
    #[sqlx(rename = "otro")]
    #[serde(rename = "otro")]
    Other,
}

impl ExpenseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseKind::Ads => "anuncios",
            ExpenseKind::Travel => "desplazamiento",
            ExpenseKind::Materials => "material",
            ExpenseKind::PlatformFee => "comision_plataforma",
            ExpenseKind::Other => "otro",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub kind: ExpenseKind,
    #[schema(example = "Campaña Google Ads marzo")]
    pub concept: String,
    #[schema(example = "250.00")]
    pub amount: Decimal,
    pub spent_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub landing_id: Option<i64>,
    pub landing_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub kind: ExpenseKind,
    pub concept: String,
    pub amount: Decimal,
    pub spent_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub landing_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseChanges {
    pub kind: Option<ExpenseKind>,
    pub concept: Option<String>,
    pub amount: Option<Decimal>,
    pub spent_at: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
    pub landing_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub kind: Option<ExpenseKind>,
    pub landing_id: Option<i64>,
    pub spent_from: Option<DateTime<Utc>>,
    pub spent_before: Option<DateTime<Utc>>,
}

/// Total do filtro inteiro (não só da página) e total por tipo.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total: Decimal,
    pub por_tipo: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExpenseKindTotal {
    pub kind: ExpenseKind,
    pub total: Decimal,
}

impl ExpenseSummary {
    pub fn from_totals(totals: &[ExpenseKindTotal]) -> Self {
        let por_tipo: BTreeMap<String, Decimal> = totals
            .iter()
            .map(|t| (t.kind.as_str().to_string(), t.total))
            .collect();
        Self {
            total: totals.iter().map(|t| t.total).sum(),
            por_tipo,
        }
    }
}
