// src/services/lead_service.rs

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Executor, Postgres};
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Pagination},
    },
    db::{ActivityRepository, LandingRepository, LeadRepository},
    models::{
        activity::{ActivityKind, NewActivity},
        lead::{
            Lead, LeadChanges, LeadDetail, LeadFilter, LeadListItem, LeadSort, LeadSource, LeadState,
            NewLead,
        },
    },
    services::{
        commission::{CommissionPolicy, amount_error},
        settings_service::SettingsService,
    },
};

/// Atividades devolvidas junto com o detalhe do lead.
pub const DETAIL_ACTIVITY_LIMIT: u32 = 50;

fn field_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    errors.add(field, err);
}

/// Aplica uma edição parcial. Não muda o estado do lead.
///
/// Orçamento e venda carimbam a data quando passam a existir e a limpam junto
/// com o valor. Limpar a venda apaga a comissão; editar a venda de um lead
/// `ganado`, ou que já tem comissão, recalcula a comissão com a taxa efetiva.
pub fn apply_changes(
    lead: &mut Lead,
    changes: LeadChanges,
    policy: &CommissionPolicy,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    if changes.source == Some(LeadSource::Landing) && lead.source != LeadSource::Landing {
        field_error(
            &mut errors,
            "fuente",
            "landing_reserved",
            "La fuente 'landing' está reservada a la API pública",
        );
    }
    if let Some(err) = changes.quoted_amount.flatten().and_then(amount_error) {
        errors.add("presupuestoEnviado", err);
    }
    if let Some(err) = changes.sale_amount.flatten().and_then(amount_error) {
        errors.add("importeVenta", err);
    }
    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    if let Some(name) = changes.name {
        lead.name = name;
    }
    if let Some(phone) = changes.phone {
        lead.phone = phone;
    }
    if let Some(email) = changes.email {
        lead.email = email;
    }
    if let Some(locality) = changes.locality {
        lead.locality = locality;
    }
    if let Some(address) = changes.address {
        lead.address = address;
    }
    if let Some(services) = changes.services {
        lead.services = services;
    }
    if let Some(notes) = changes.notes {
        lead.notes = notes;
    }
    if let Some(source) = changes.source {
        lead.source = source;
    }
    if let Some(priority) = changes.priority {
        lead.priority = priority;
    }
    if let Some(paid) = changes.commission_paid {
        lead.commission_paid = paid;
    }

    match changes.quoted_amount {
        Some(Some(amount)) => lead.record_quote(amount, now),
        Some(None) => {
            lead.quoted_amount = None;
            lead.quote_date = None;
        }
        None => {}
    }

    match changes.sale_amount {
        Some(Some(amount)) => {
            // Comissão já gerada acompanha a venda, mesmo fora de `ganado`
            if lead.state == LeadState::Won || lead.commission_amount.is_some() {
                lead.commission_amount = Some(policy.compute(amount, None)?);
            }
            lead.sale_amount = Some(amount);
            lead.sale_date.get_or_insert(now);
        }
        Some(None) => lead.clear_sale(),
        None => {}
    }

    Ok(())
}

#[derive(Clone)]
pub struct LeadService {
    leads: LeadRepository,
    activities: ActivityRepository,
    landings: LandingRepository,
    settings: SettingsService,
}

impl LeadService {
    pub fn new(
        leads: LeadRepository,
        activities: ActivityRepository,
        landings: LandingRepository,
        settings: SettingsService,
    ) -> Self {
        Self {
            leads,
            activities,
            landings,
            settings,
        }
    }

    /// Criação manual pelo painel: lead + atividade de criação.
    pub async fn create_manual<'e, E>(&self, executor: E, new_lead: NewLead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = self.leads.insert(&mut *tx, &new_lead).await?;
        let activity = NewActivity::new(lead.id, ActivityKind::Creation, "Lead creado manualmente")
            .with_states(None, Some(lead.state));
        self.activities.append(&mut *tx, &activity).await?;

        tx.commit().await?;

        tracing::info!(lead_id = lead.id, source = lead.source.as_str(), "Lead criado manualmente");
        Ok(lead)
    }

    pub async fn get_detail<'e, E>(&self, executor: E, id: i64) -> Result<LeadDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let lead = self.leads.find_by_id(&mut *conn, id).await?;
        let landing = match lead.landing_id {
            Some(landing_id) => match self.landings.find_by_id(&mut *conn, landing_id).await {
                Ok(landing) => Some(landing.into()),
                Err(AppError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        let activities = self
            .activities
            .list_for_lead(&mut *conn, id, DETAIL_ACTIVITY_LIMIT)
            .await?;

        Ok(LeadDetail {
            lead,
            landing,
            activities,
        })
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, changes: LeadChanges) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut lead = self.leads.find_for_update(&mut *tx, id).await?;
        let rate = self.settings.commission_rate(&mut *tx).await?;
        apply_changes(&mut lead, changes, &CommissionPolicy::new(rate), Utc::now())?;
        let lead = self.leads.save(&mut *tx, &lead).await?;

        tx.commit().await?;

        tracing::info!(lead_id = lead.id, "Lead atualizado");
        Ok(lead)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.leads.delete(executor, id).await?;
        tracing::info!(lead_id = id, "Lead removido");
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &LeadFilter,
        sort: LeadSort,
        page: PageRequest,
    ) -> Result<(Vec<LeadListItem>, Pagination), AppError> {
        let (leads, total) = self.leads.list(filter, sort, page).await?;
        Ok((leads, Pagination::new(page, total)))
    }
}
