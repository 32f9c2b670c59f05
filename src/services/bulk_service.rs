// src/services/bulk_service.rs

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{Acquire, Executor, Postgres};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::LeadRepository,
    models::lead::{LeadPriority, LeadState},
    services::settings_service::SettingsService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    UpdateState(LeadState),
    UpdatePriority(LeadPriority),
}

impl BulkAction {
    /// `updateStatus` é aceito como sinônimo de `updateState`.
    pub fn parse(action: &str, value: Option<&str>) -> Result<Self, AppError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        match action {
            "delete" => Ok(BulkAction::Delete),
            "updateState" | "updateStatus" => {
                let value = value.ok_or(AppError::InvalidArgument("value_required"))?;
                Ok(BulkAction::UpdateState(value.parse()?))
            }
            "updatePriority" => {
                let value = value.ok_or(AppError::InvalidArgument("value_required"))?;
                Ok(BulkAction::UpdatePriority(value.parse()?))
            }
            _ => Err(AppError::InvalidArgument("invalid_bulk_action")),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkOutcome {
    pub success: bool,
    #[schema(example = "3 leads actualizados")]
    pub message: String,
    pub count: u64,
}

/// Remove ids repetidos mantendo a ordem. Lista vazia é erro de validação.
pub fn unique_ids(ids: &[i64]) -> Result<Vec<i64>, AppError> {
    if ids.is_empty() {
        return Err(AppError::validation(
            "ids",
            "required",
            "Debe indicar al menos un lead",
        ));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

#[derive(Clone)]
pub struct BulkService {
    leads: LeadRepository,
    settings: SettingsService,
}

impl BulkService {
    pub fn new(leads: LeadRepository, settings: SettingsService) -> Self {
        Self { leads, settings }
    }

    /// Aplica a ação a todos os ids existentes numa só transação.
    /// Ids inexistentes são ignorados; `count` diz quantos foram afetados.
    pub async fn apply<'e, E>(&self, executor: E, ids: &[i64], action: BulkAction) -> Result<BulkOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let ids = unique_ids(ids)?;
        let mut tx = executor.begin().await?;

        let (count, message) = match action {
            BulkAction::Delete => {
                let count = self.leads.delete_many(&mut *tx, &ids).await?;
                (count, format!("{count} leads eliminados"))
            }
            BulkAction::UpdateState(state) => {
                // Em massa não há valor de venda: `ganado` não exige importe aqui,
                // mas a venda já registrada gera a comissão que falta
                let commission_percent = match state {
                    LeadState::Won => Some(self.settings.commission_rate(&mut *tx).await?.percent()),
                    _ => None,
                };
                let description = format!("Estado cambiado a {state} (acción masiva)");
                let count = self
                    .leads
                    .update_state_many(&mut *tx, &ids, state, &description, commission_percent)
                    .await?;
                (count, format!("{count} leads actualizados"))
            }
            BulkAction::UpdatePriority(priority) => {
                let count = self.leads.update_priority_many(&mut *tx, &ids, priority).await?;
                (count, format!("{count} leads actualizados"))
            }
        };

        tx.commit().await?;

        tracing::info!(requested = ids.len(), affected = count, action = ?action, "Ação em massa aplicada");
        Ok(BulkOutcome {
            success: true,
            message,
            count,
        })
    }
}
