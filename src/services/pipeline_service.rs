// src/services/pipeline_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value, json};
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{ActivityRepository, LeadRepository},
    models::{
        activity::{ActivityKind, NewActivity},
        lead::{Lead, LeadState, SaleRecord},
    },
    services::{
        commission::{CommissionPolicy, CommissionRate, check_amount},
        settings_service::SettingsService,
    },
};

/// Opções de uma mudança de etapa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionOptions {
    pub sale_amount: Option<Decimal>,
    pub note: Option<String>,
    /// Sobrepõe a taxa configurada só nesta chamada.
    pub commission_rate: Option<CommissionRate>,
}

/// Resultado calculado de uma transição, ainda não gravado.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub lead: Lead,
    pub activity: NewActivity,
}

/// Calcula o novo estado do lead e a atividade correspondente. Função pura.
///
/// Qualquer etapa pode ir para qualquer outra. Só `ganado` tem pré-condição:
/// precisa de um valor de venda, vindo das opções, da venda já registrada ou
/// do orçamento, nessa ordem. Para as demais etapas os campos financeiros
/// ficam como estão, mesmo saindo de `ganado`.
pub fn plan_transition(
    mut lead: Lead,
    target: LeadState,
    options: &TransitionOptions,
    policy: &CommissionPolicy,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, AppError> {
    if let Some(amount) = options.sale_amount {
        check_amount("importeVenta", amount)?;
    }

    let previous = lead.state;
    let mut metadata = Map::new();
    if let Some(amount) = options.sale_amount {
        metadata.insert("saleAmount".into(), json!(amount));
    }

    if target == LeadState::Won {
        let amount = options
            .sale_amount
            .or(lead.sale_amount)
            .or(lead.quoted_amount)
            .ok_or(AppError::InvalidTransition("missing_sale_amount"))?;

        let rate = policy.effective_rate(options.commission_rate);
        let commission = policy.compute(amount, options.commission_rate)?;

        lead.record_sale(SaleRecord {
            amount,
            date: now,
            commission: Some(commission),
        });

        metadata.insert("saleAmount".into(), json!(amount));
        metadata.insert("commissionAmount".into(), json!(commission));
        metadata.insert("commissionRate".into(), json!(rate.percent()));
    }

    lead.state = target;

    let description = options
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Estado cambiado de {previous} a {target}"));

    let mut activity = NewActivity::new(lead.id, ActivityKind::for_transition(target), description)
        .with_states(Some(previous), Some(target));
    if !metadata.is_empty() {
        activity = activity.with_metadata(Value::Object(metadata));
    }

    Ok(TransitionPlan { lead, activity })
}

#[derive(Clone)]
pub struct PipelineService {
    leads: LeadRepository,
    activities: ActivityRepository,
    settings: SettingsService,
}

impl PipelineService {
    pub fn new(leads: LeadRepository, activities: ActivityRepository, settings: SettingsService) -> Self {
        Self {
            leads,
            activities,
            settings,
        }
    }

    /// Move o lead para `target`. Lead e atividade são gravados na mesma transação.
    pub async fn transition<'e, E>(
        &self,
        executor: E,
        lead_id: i64,
        target: LeadState,
        options: TransitionOptions,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Trava o lead (NotFound antes de qualquer escrita)
        let lead = self.leads.find_for_update(&mut *tx, lead_id).await?;
        let previous = lead.state;

        // 2. Taxa efetiva e plano
        let rate = self.settings.commission_rate(&mut *tx).await?;
        let plan = plan_transition(lead, target, &options, &CommissionPolicy::new(rate), Utc::now())?;

        // 3. Grava lead + histórico
        let lead = self.leads.save(&mut *tx, &plan.lead).await?;
        self.activities.append(&mut *tx, &plan.activity).await?;

        tx.commit().await?;

        tracing::info!(
            lead_id,
            from = %previous,
            to = %target,
            sale_amount = ?lead.sale_amount,
            "Lead movido no funil"
        );
        Ok(lead)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::models::lead::{LeadPriority, LeadSource};

    pub(crate) fn sample_lead(state: LeadState) -> Lead {
        let created = Utc::now();
        Lead {
            id: 7,
            name: "Ana García".into(),
            phone: "611222333".into(),
            email: None,
            locality: Some("Valencia".into()),
            address: None,
            state,
            source: LeadSource::Landing,
            priority: LeadPriority::Medium,
            services: vec!["ventanas".into()],
            quoted_amount: None,
            quote_date: None,
            sale_amount: None,
            sale_date: None,
            commission_amount: None,
            commission_paid: false,
            landing_id: Some(1),
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
            origin_ip: None,
            user_agent: None,
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn ten_percent() -> CommissionPolicy {
        CommissionPolicy::default()
    }

    fn with_amount(amount: Decimal) -> TransitionOptions {
        TransitionOptions {
            sale_amount: Some(amount),
            ..Default::default()
        }
    }

    #[test]
    fn won_with_amount_records_the_sale_and_commission() {
        let now = Utc::now();
        let plan = plan_transition(
            sample_lead(LeadState::Negotiating),
            LeadState::Won,
            &with_amount(dec!(1000)),
            &ten_percent(),
            now,
        )
        .unwrap();

        assert_eq!(plan.lead.state, LeadState::Won);
        assert_eq!(plan.lead.sale_amount, Some(dec!(1000)));
        assert_eq!(plan.lead.sale_date, Some(now));
        assert_eq!(plan.lead.commission_amount, Some(dec!(100.00)));

        assert_eq!(plan.activity.kind, ActivityKind::SaleWon);
        assert_eq!(plan.activity.previous_state, Some(LeadState::Negotiating));
        assert_eq!(plan.activity.new_state, Some(LeadState::Won));
        let metadata = plan.activity.metadata.unwrap();
        assert_eq!(metadata["saleAmount"], json!(dec!(1000)));
        assert_eq!(metadata["commissionAmount"], json!(dec!(100.00)));
    }

    #[test]
    fn won_without_any_amount_is_rejected() {
        let err = plan_transition(
            sample_lead(LeadState::Quoted),
            LeadState::Won,
            &TransitionOptions::default(),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition("missing_sale_amount")));
    }

    #[test]
    fn won_falls_back_to_sale_then_quote() {
        let mut quoted = sample_lead(LeadState::Quoted);
        quoted.quoted_amount = Some(dec!(500));
        let plan = plan_transition(quoted, LeadState::Won, &Default::default(), &ten_percent(), Utc::now())
            .unwrap();
        assert_eq!(plan.lead.sale_amount, Some(dec!(500)));
        assert_eq!(plan.lead.commission_amount, Some(dec!(50.00)));

        let mut sold = sample_lead(LeadState::Lost);
        sold.quoted_amount = Some(dec!(500));
        sold.sale_amount = Some(dec!(800));
        let plan = plan_transition(sold, LeadState::Won, &Default::default(), &ten_percent(), Utc::now())
            .unwrap();
        assert_eq!(plan.lead.sale_amount, Some(dec!(800)));
        assert_eq!(plan.lead.commission_amount, Some(dec!(80.00)));
    }

    #[test]
    fn zero_is_a_valid_sale_amount() {
        let plan = plan_transition(
            sample_lead(LeadState::New),
            LeadState::Won,
            &with_amount(Decimal::ZERO),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.lead.commission_amount, Some(Decimal::ZERO));
    }

    #[test]
    fn negative_sale_amount_is_a_validation_error() {
        let err = plan_transition(
            sample_lead(LeadState::New),
            LeadState::Won,
            &with_amount(dec!(-1)),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn oversized_or_fractional_cent_amounts_are_validation_errors() {
        let huge: Decimal = "70000000000000000000000000000".parse().unwrap();
        for amount in [huge, dec!(10000000000), dec!(0.045)] {
            let err = plan_transition(
                sample_lead(LeadState::Negotiating),
                LeadState::Won,
                &with_amount(amount),
                &ten_percent(),
                Utc::now(),
            )
            .unwrap_err();
            let AppError::ValidationError(errors) = err else {
                panic!("esperava erro de validação para {amount}");
            };
            assert!(errors.field_errors().contains_key("importeVenta"));
        }
    }

    #[test]
    fn stored_quote_too_large_for_a_sale_is_rejected_on_won() {
        let mut lead = sample_lead(LeadState::Quoted);
        lead.quoted_amount = Some(Decimal::MAX);
        let err = plan_transition(lead, LeadState::Won, &Default::default(), &ten_percent(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn leaving_won_keeps_the_sale_record() {
        let won = plan_transition(
            sample_lead(LeadState::Negotiating),
            LeadState::Won,
            &with_amount(dec!(1000)),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap()
        .lead;
        for target in LeadState::ALL.into_iter().filter(|s| *s != LeadState::Won) {
            let plan = plan_transition(won.clone(), target, &Default::default(), &ten_percent(), Utc::now())
                .unwrap();
            assert_eq!(plan.lead.state, target);
            assert_eq!(plan.lead.sale_amount, won.sale_amount);
            assert_eq!(plan.lead.sale_date, won.sale_date);
            assert_eq!(plan.lead.commission_amount, Some(dec!(100.00)));
        }
    }

    #[test]
    fn non_won_targets_ignore_the_amount_for_the_lead_but_log_it() {
        let plan = plan_transition(
            sample_lead(LeadState::New),
            LeadState::Quoted,
            &with_amount(dec!(300)),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(plan.lead.sale_amount, None);
        assert_eq!(plan.lead.commission_amount, None);
        assert_eq!(plan.activity.kind, ActivityKind::StateChange);
        assert_eq!(plan.activity.metadata.unwrap()["saleAmount"], json!(dec!(300)));
    }

    #[test]
    fn lost_is_logged_as_sale_lost() {
        let plan = plan_transition(
            sample_lead(LeadState::Negotiating),
            LeadState::Lost,
            &Default::default(),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.activity.kind, ActivityKind::SaleLost);
        assert!(plan.activity.metadata.is_none());
    }

    #[test]
    fn same_state_still_produces_an_activity() {
        let plan = plan_transition(
            sample_lead(LeadState::Contacted),
            LeadState::Contacted,
            &Default::default(),
            &ten_percent(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.activity.previous_state, plan.activity.new_state);
        assert_eq!(plan.activity.description, "Estado cambiado de contactado a contactado");
    }

    #[test]
    fn note_replaces_the_generated_description() {
        let options = TransitionOptions {
            note: Some("  Cliente pidió visita  ".into()),
            ..Default::default()
        };
        let plan = plan_transition(sample_lead(LeadState::New), LeadState::Meeting, &options, &ten_percent(), Utc::now())
            .unwrap();
        assert_eq!(plan.activity.description, "Cliente pidió visita");
    }

    #[test]
    fn per_call_rate_overrides_the_policy() {
        let options = TransitionOptions {
            sale_amount: Some(dec!(1000)),
            commission_rate: Some(CommissionRate::new(dec!(15)).unwrap()),
            ..Default::default()
        };
        let plan = plan_transition(sample_lead(LeadState::New), LeadState::Won, &options, &ten_percent(), Utc::now())
            .unwrap();
        assert_eq!(plan.lead.commission_amount, Some(dec!(150.00)));
    }
}
