// src/services/activity_service.rs

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{ActivityRepository, LeadRepository},
    models::activity::{Activity, ActivityKind, NewActivity},
    services::commission::check_amount,
};

/// Valor de `importe` nos metadados de um orçamento. Aceita número ou texto.
pub fn quote_amount(metadata: Option<&Value>) -> Result<Option<Decimal>, AppError> {
    let raw = match metadata.and_then(|m| m.get("importe")) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(invalid_amount()),
    };

    let amount = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| invalid_amount())?;
    check_amount("importe", amount).map(Some)
}

fn invalid_amount() -> AppError {
    AppError::validation(
        "importe",
        "range",
        "El importe debe ser un número mayor o igual que 0",
    )
}

#[derive(Clone)]
pub struct ActivityService {
    leads: LeadRepository,
    activities: ActivityRepository,
}

impl ActivityService {
    pub fn new(leads: LeadRepository, activities: ActivityRepository) -> Self {
        Self { leads, activities }
    }

    /// Anotação manual (nota, ligação, orçamento...). Tipos do sistema são recusados.
    /// Um orçamento com `importe` também grava o valor no lead, na mesma transação.
    pub async fn record<'e, E>(
        &self,
        executor: E,
        lead_id: i64,
        kind: ActivityKind,
        description: &str,
        metadata: Option<Value>,
    ) -> Result<Activity, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !kind.is_user_entry() {
            return Err(AppError::InvalidArgument("invalid_activity_kind"));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::validation(
                "descripcion",
                "required",
                "La descripción es obligatoria",
            ));
        }
        let quoted = if kind.is_quote() {
            quote_amount(metadata.as_ref())?
        } else {
            None
        };

        let mut tx = executor.begin().await?;

        let mut lead = self.leads.find_for_update(&mut *tx, lead_id).await?;
        if let Some(amount) = quoted {
            lead.record_quote(amount, Utc::now());
            self.leads.save(&mut *tx, &lead).await?;
        }

        let mut activity = NewActivity::new(lead_id, kind, description);
        if let Some(metadata) = metadata {
            activity = activity.with_metadata(metadata);
        }
        let activity = self.activities.append(&mut *tx, &activity).await?;

        tx.commit().await?;

        tracing::info!(lead_id, activity_id = activity.id, kind = ?kind, "Atividade registrada");
        Ok(activity)
    }

    pub async fn list_for_lead<'e, E>(
        &self,
        executor: E,
        lead_id: i64,
        limit: u32,
    ) -> Result<Vec<Activity>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        // Lead inexistente é 404, não lista vazia
        self.leads.find_by_id(&mut *conn, lead_id).await?;
        self.activities.list_for_lead(&mut *conn, lead_id, limit).await
    }
}
