// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::lead::LeadState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_kind")]
pub enum ActivityKind {
    #[sqlx(rename = "creacion")]
    #[serde(rename = "creacion")]
    Creation,
    #[sqlx(rename = "nota")]
    #[serde(rename = "nota")]
    Note,
    #[sqlx(rename = "llamada")]
    #[serde(rename = "llamada")]
    Call,
    #[sqlx(rename = "email")]
    #[serde(rename = "email")]
    Email,
    #[sqlx(rename = "reunion")]
    #[serde(rename = "reunion")]
    Meeting,
    #[sqlx(rename = "whatsapp")]
    #[serde(rename = "whatsapp")]
    Chat,
    #[sqlx(rename = "presupuesto_enviado")]
    #[serde(rename = "presupuesto_enviado")]
    QuoteSent,
    #[sqlx(rename = "presupuesto_actualizado")]
    #[serde(rename = "presupuesto_actualizado")]
    QuoteUpdated,
    #[sqlx(rename = "cambio_estado")]
    #[serde(rename = "cambio_estado")]
    StateChange,
    #[sqlx(rename = "venta_cerrada")]
    #[serde(rename = "venta_cerrada")]
    SaleWon,
    #[sqlx(rename = "venta_perdida")]
    #[serde(rename = "venta_perdida")]
    SaleLost,
}

impl ActivityKind {
    /// Tipo registrado por uma transição de etapa.
    pub fn for_transition(target: LeadState) -> Self {
        match target {
            LeadState::Won => ActivityKind::SaleWon,
            LeadState::Lost => ActivityKind::SaleLost,
            _ => ActivityKind::StateChange,
        }
    }

    /// Tipos que o usuário pode registrar à mão. Os demais são do sistema.
    pub fn is_user_entry(self) -> bool {
        !matches!(
            self,
            ActivityKind::Creation
                | ActivityKind::StateChange
                | ActivityKind::SaleWon
                | ActivityKind::SaleLost
        )
    }

    pub fn is_quote(self) -> bool {
        matches!(self, ActivityKind::QuoteSent | ActivityKind::QuoteUpdated)
    }
}

/// Entrada do histórico. Imutável: não existe update nem delete.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub lead_id: i64,
    pub kind: ActivityKind,
    #[schema(example = "Estado cambiado de nuevo a contactado")]
    pub description: String,
    pub previous_state: Option<LeadState>,
    pub new_state: Option<LeadState>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub lead_id: i64,
    pub kind: ActivityKind,
    pub description: String,
    pub previous_state: Option<LeadState>,
    pub new_state: Option<LeadState>,
    pub metadata: Option<Value>,
}

impl NewActivity {
    pub fn new(lead_id: i64, kind: ActivityKind, description: impl Into<String>) -> Self {
        Self {
            lead_id,
            kind,
            description: description.into(),
            previous_state: None,
            new_state: None,
            metadata: None,
        }
    }

    pub fn with_states(mut self, previous: Option<LeadState>, new: Option<LeadState>) -> Self {
        self.previous_state = previous;
        self.new_state = new;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
