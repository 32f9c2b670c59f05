// src/services/ingestion_service.rs

use serde_json::{Value, json};
use sqlx::{Acquire, Executor, Postgres};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{ActivityRepository, LandingRepository, LeadRepository},
    middleware::client::ClientInfo,
    models::{
        activity::{ActivityKind, NewActivity},
        landing::Landing,
        lead::{LandingOrigin, Lead, LeadSubmission, NewLead, UtmParams},
    },
};

fn utm_metadata(utm: &UtmParams) -> Value {
    json!({
        "source": utm.source,
        "medium": utm.medium,
        "campaign": utm.campaign,
        "term": utm.term,
        "content": utm.content,
    })
}

/// Entrada pública de leads vindos das landings.
#[derive(Clone)]
pub struct IngestionService {
    landings: LandingRepository,
    leads: LeadRepository,
    activities: ActivityRepository,
}

impl IngestionService {
    pub fn new(landings: LandingRepository, leads: LeadRepository, activities: ActivityRepository) -> Self {
        Self {
            landings,
            leads,
            activities,
        }
    }

    /// Landing ativa dona da chave. Chave ausente, desconhecida ou de landing
    /// inativa dão o mesmo `Unauthorized`.
    pub async fn authenticate<'e, E>(&self, executor: E, api_key: Option<&str>) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(api_key) = api_key else {
            return Err(AppError::Unauthorized);
        };

        self.landings
            .find_active_by_api_key(executor, api_key)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Autentica, valida e cria o lead com a atividade de criação.
    pub async fn ingest<'e, E>(
        &self,
        executor: E,
        api_key: Option<&str>,
        submission: LeadSubmission,
        client: ClientInfo,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Autenticação antes de olhar o corpo
        let landing = self.authenticate(&mut *tx, api_key).await?;

        // 2. Validação (tudo ou nada)
        let submission = submission.normalized();
        submission.validate()?;

        // 3. Lead + atividade
        let (contact, utm) = submission.into_parts();
        let metadata = json!({
            "landing": { "id": landing.id, "name": landing.name, "slug": landing.slug },
            "utm": utm_metadata(&utm),
        });
        let new_lead = NewLead::from_landing(
            contact,
            LandingOrigin {
                landing_id: landing.id,
                utm,
                origin_ip: client.ip,
                user_agent: client.user_agent,
            },
        );

        let lead = self.leads.insert(&mut *tx, &new_lead).await?;
        let activity = NewActivity::new(
            lead.id,
            ActivityKind::Creation,
            format!("Lead recibido desde landing: {}", landing.name),
        )
        .with_states(None, Some(lead.state))
        .with_metadata(metadata);
        self.activities.append(&mut *tx, &activity).await?;

        tx.commit().await?;

        tracing::info!(lead_id = lead.id, landing_id = landing.id, landing = %landing.slug, "Lead recebido da landing");
        Ok(lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utm_metadata_keeps_missing_values_as_null() {
        let utm = UtmParams {
            source: Some("google".into()),
            campaign: Some("primavera".into()),
            ..Default::default()
        };
        let value = utm_metadata(&utm);
        assert_eq!(value["source"], "google");
        assert_eq!(value["campaign"], "primavera");
        assert!(value["medium"].is_null());
    }
}
