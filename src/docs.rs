// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;
use crate::common;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::change_state,
        handlers::leads::bulk_action,

        // --- Actividad ---
        handlers::activities::list_activities,
        handlers::activities::create_activity,

        // --- Landings ---
        handlers::landings::list_landings,
        handlers::landings::create_landing,
        handlers::landings::get_landing,
        handlers::landings::update_landing,
        handlers::landings::delete_landing,
        handlers::landings::regenerate_key,

        // --- Gastos ---
        handlers::expenses::list_expenses,
        handlers::expenses::create_expense,
        handlers::expenses::get_expense,
        handlers::expenses::update_expense,
        handlers::expenses::delete_expense,

        // --- Informes ---
        handlers::reports::get_balance,
        handlers::reports::get_dashboard,

        // --- Configuración ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Público ---
        handlers::public::ingest_lead,
    ),
    components(
        schemas(
            common::pagination::Pagination,

            // --- Leads ---
            models::lead::LeadState,
            models::lead::LeadSource,
            models::lead::LeadPriority,
            models::lead::Lead,
            models::lead::LeadListItem,
            models::lead::LeadDetail,
            models::lead::LeadSubmission,
            handlers::leads::CreateLeadPayload,
            handlers::leads::UpdateLeadPayload,
            handlers::leads::ChangeStatePayload,
            handlers::leads::BulkPayload,
            handlers::leads::LeadListResponse,
            services::bulk_service::BulkOutcome,

            // --- Actividad ---
            models::activity::ActivityKind,
            models::activity::Activity,
            handlers::activities::CreateActivityPayload,

            // --- Landings ---
            models::landing::Landing,
            models::landing::LandingSummary,
            models::landing::LandingWithCount,
            handlers::landings::CreateLandingPayload,
            handlers::landings::UpdateLandingPayload,

            // --- Gastos ---
            models::expense::ExpenseKind,
            models::expense::Expense,
            models::expense::ExpenseSummary,
            handlers::expenses::CreateExpensePayload,
            handlers::expenses::UpdateExpensePayload,
            handlers::expenses::ExpenseListResponse,

            // --- Informes ---
            models::reports::WonLeadEntry,
            models::reports::MonthlySales,
            models::reports::BalanceTotals,
            models::reports::BalanceReport,
            models::reports::DashboardKpis,
            models::reports::CountEntry,
            models::reports::DashboardReport,

            // --- Configuración ---
            models::settings::AppSettings,
            models::settings::UpdateSettingsRequest,

            // --- Público ---
            handlers::public::IngestResponse,
        )
    ),
    tags(
        (name = "Leads", description = "Gestão de leads e pipeline de vendas"),
        (name = "Pipeline", description = "Mudança de etapa e fechamento de venda"),
        (name = "Actividad", description = "Histórico de atividades do lead"),
        (name = "Landings", description = "Landings e suas API Keys"),
        (name = "Gastos", description = "Gastos operacionais"),
        (name = "Informes", description = "Balanço e indicadores"),
        (name = "Configuración", description = "Taxa de comissão e moeda"),
        (name = "Público", description = "Webhook de ingestão chamado pelas landings")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "landing_api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_state_change_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leads/{id}/estado"));
        assert!(doc.paths.paths.contains_key("/api/public/leads"));
    }
}
