// src/models/lead.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{activity::Activity, landing::LandingSummary},
};

// --- ENUMS ---
// Os valores (banco e JSON) são os do funil original, em espanhol.

/// Etapa do funil. Qualquer etapa pode ir para qualquer outra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_state")]
pub enum LeadState {
    #[sqlx(rename = "nuevo")]
    #[serde(rename = "nuevo")]
    New,
    #[sqlx(rename = "contactado")]
    #[serde(rename = "contactado")]
    Contacted,
    #[sqlx(rename = "cualificado")]
    #[serde(rename = "cualificado")]
    Qualified,
    #[sqlx(rename = "reunion")]
    #[serde(rename = "reunion")]
    Meeting,
    #[sqlx(rename = "presupuestado")]
    #[serde(rename = "presupuestado")]
    Quoted,
    #[sqlx(rename = "negociacion")]
    #[serde(rename = "negociacion")]
    Negotiating,
    #[sqlx(rename = "ganado")]
    #[serde(rename = "ganado")]
    Won,
    #[sqlx(rename = "perdido")]
    #[serde(rename = "perdido")]
    Lost,
}

impl LeadState {
    pub const ALL: [LeadState; 8] = [
        LeadState::New,
        LeadState::Contacted,
        LeadState::Qualified,
        LeadState::Meeting,
        LeadState::Quoted,
        LeadState::Negotiating,
        LeadState::Won,
        LeadState::Lost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadState::New => "nuevo",
            LeadState::Contacted => "contactado",
            LeadState::Qualified => "cualificado",
            LeadState::Meeting => "reunion",
            LeadState::Quoted => "presupuestado",
            LeadState::Negotiating => "negociacion",
            LeadState::Won => "ganado",
            LeadState::Lost => "perdido",
        }
    }
}

impl FromStr for LeadState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or(AppError::InvalidArgument("invalid_state"))
    }
}

impl fmt::Display for LeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source")]
pub enum LeadSource {
    #[sqlx(rename = "landing")]
    #[serde(rename = "landing")]
    Landing,
    #[sqlx(rename = "google_ads")]
    #[serde(rename = "google_ads")]
    PaidSearch,
    #[sqlx(rename = "organico")]
    #[serde(rename = "organico")]
    Organic,
    #[sqlx(rename = "referido")]
    #[serde(rename = "referido")]
    Referral,
    #[sqlx(rename = "redes_sociales")]
    #[serde(rename = "redes_sociales")]
    Social,
    #[sqlx(rename = "directo")]
    #[serde(rename = "directo")]
    Direct,
    #[sqlx(rename = "otro")]
    #[serde(rename = "otro")]
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 7] = [
        LeadSource::Landing,
        LeadSource::PaidSearch,
        LeadSource::Organic,
        LeadSource::Referral,
        LeadSource::Social,
        LeadSource::Direct,
        LeadSource::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Landing => "landing",
            LeadSource::PaidSearch => "google_ads",
            LeadSource::Organic => "organico",
            LeadSource::Referral => "referido",
            LeadSource::Social => "redes_sociales",
            LeadSource::Direct => "directo",
            LeadSource::Other => "otro",
        }
    }
}

impl FromStr for LeadSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or(AppError::InvalidArgument("invalid_source"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_priority")]
pub enum LeadPriority {
    #[sqlx(rename = "baja")]
    #[serde(rename = "baja")]
    Low,
    #[default]
    #[sqlx(rename = "media")]
    #[serde(rename = "media")]
    Medium,
    #[sqlx(rename = "alta")]
    #[serde(rename = "alta")]
    High,
    #[sqlx(rename = "urgente")]
    #[serde(rename = "urgente")]
    Urgent,
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 4] = [
        LeadPriority::Low,
        LeadPriority::Medium,
        LeadPriority::High,
        LeadPriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadPriority::Low => "baja",
            LeadPriority::Medium => "media",
            LeadPriority::High => "alta",
            LeadPriority::Urgent => "urgente",
        }
    }
}

impl FromStr for LeadPriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or(AppError::InvalidArgument("invalid_priority"))
    }
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[schema(example = 42)]
    pub id: i64,

    #[schema(example = "Ana García")]
    pub name: String,
    #[schema(example = "611222333")]
    pub phone: String,
    pub email: Option<String>,
    pub locality: Option<String>,
    pub address: Option<String>,

    pub state: LeadState,
    pub source: LeadSource,
    pub priority: LeadPriority,
    #[schema(example = json!(["ventanas", "persianas"]))]
    pub services: Vec<String>,

    // Financeiro
    #[schema(example = "1500.00")]
    pub quoted_amount: Option<Decimal>,
    pub quote_date: Option<DateTime<Utc>>,
    #[schema(example = "1000.00")]
    pub sale_amount: Option<Decimal>,
    pub sale_date: Option<DateTime<Utc>>,
    #[schema(example = "100.00")]
    pub commission_amount: Option<Decimal>,
    pub commission_paid: bool,

    // Atribuição
    pub landing_id: Option<i64>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub origin_ip: Option<String>,
    pub user_agent: Option<String>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Venda registrada. Independe da etapa atual: sair de `ganado` não apaga a venda.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub commission: Option<Decimal>,
}

impl Lead {
    /// Grava o orçamento. A data marca o primeiro orçamento e não muda nas revisões.
    pub fn record_quote(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.quoted_amount = Some(amount);
        self.quote_date.get_or_insert(now);
    }

    pub fn record_sale(&mut self, sale: SaleRecord) {
        self.sale_amount = Some(sale.amount);
        self.sale_date = Some(sale.date);
        self.commission_amount = sale.commission;
    }

    pub fn clear_sale(&mut self) {
        self.sale_amount = None;
        self.sale_date = None;
        self.commission_amount = None;
    }
}

/// Linha da listagem: lead + resumo da landing + total de atividades.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lead: Lead,
    pub landing_name: Option<String>,
    pub landing_slug: Option<String>,
    pub activity_count: i64,
}

/// Detalhe: lead, landing de origem e atividades mais recentes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: Lead,
    pub landing: Option<LandingSummary>,
    pub activities: Vec<Activity>,
}

// --- CRIAÇÃO ---

/// Remove todo espaço em branco do telefone (`"611 22 23 33"` -> `"611222333"`).
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Corpo enviado pelas landings à API pública.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LeadSubmission {
    #[validate(length(min = 2, max = 255, message = "El nombre debe tener entre 2 y 255 caracteres"))]
    #[schema(example = "Ana García")]
    pub nombre: String,

    #[validate(length(min = 9, max = 20, message = "El teléfono debe tener entre 9 y 20 caracteres"))]
    #[schema(example = "611 222 333")]
    pub telefono: String,

    #[validate(
        email(message = "Email inválido"),
        length(max = 255, message = "El email no puede superar 255 caracteres")
    )]
    pub email: Option<String>,

    pub localidad: Option<String>,
    pub direccion: Option<String>,
    #[serde(default)]
    pub servicios: Vec<String>,
    pub notas: Option<String>,

    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

impl LeadSubmission {
    /// Normaliza antes de validar: o telefone guardado sempre respeita os limites.
    pub fn normalized(mut self) -> Self {
        self.nombre = self.nombre.trim().to_string();
        self.telefono = normalize_phone(&self.telefono);
        self.email = non_blank(self.email);
        self
    }

    pub fn into_parts(self) -> (LeadContact, UtmParams) {
        let contact = LeadContact {
            name: self.nombre,
            phone: self.telefono,
            email: self.email,
            locality: non_blank(self.localidad),
            address: non_blank(self.direccion),
            services: self.servicios,
            notes: non_blank(self.notas),
        };
        let utm = UtmParams {
            source: non_blank(self.utm_source),
            medium: non_blank(self.utm_medium),
            campaign: non_blank(self.utm_campaign),
            term: non_blank(self.utm_term),
            content: non_blank(self.utm_content),
        };
        (contact, utm)
    }
}

/// `Some("")` e `Some("   ")` viram `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Dados de contato comuns a todas as formas de criação.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub locality: Option<String>,
    pub address: Option<String>,
    pub services: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

/// Origem autenticada (landing validada por API Key).
#[derive(Debug, Clone, PartialEq)]
pub struct LandingOrigin {
    pub landing_id: i64,
    pub utm: UtmParams,
    pub origin_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Lead a ser inserido. Os campos são privados: `source = landing` e `landing_id`
/// só podem ser definidos por `from_landing`, usado pela ingestão autenticada.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    contact: LeadContact,
    source: LeadSource,
    priority: LeadPriority,
    origin: Option<LandingOrigin>,
}

impl NewLead {
    /// Criação manual. Não aceita `fuente = landing`.
    pub fn manual(contact: LeadContact, source: LeadSource, priority: LeadPriority) -> Result<Self, AppError> {
        if source == LeadSource::Landing {
            return Err(AppError::validation(
                "fuente",
                "landing_reserved",
                "La fuente 'landing' está reservada a la API pública",
            ));
        }
        Ok(Self {
            contact,
            source,
            priority,
            origin: None,
        })
    }

    pub(crate) fn from_landing(contact: LeadContact, origin: LandingOrigin) -> Self {
        Self {
            contact,
            source: LeadSource::Landing,
            priority: LeadPriority::default(),
            origin: Some(origin),
        }
    }

    pub fn contact(&self) -> &LeadContact {
        &self.contact
    }

    pub fn source(&self) -> LeadSource {
        self.source
    }

    pub fn priority(&self) -> LeadPriority {
        self.priority
    }

    pub fn origin(&self) -> Option<&LandingOrigin> {
        self.origin.as_ref()
    }
}

// --- ATUALIZAÇÃO PARCIAL ---
// `None` = não mexe. `Some(None)` = limpa o campo.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Option<String>>,
    pub locality: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub services: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
    pub source: Option<LeadSource>,
    pub priority: Option<LeadPriority>,
    pub quoted_amount: Option<Option<Decimal>>,
    pub sale_amount: Option<Option<Decimal>>,
    pub commission_paid: Option<bool>,
}

// --- LISTAGEM ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadSortField {
    Id,
    CreatedAt,
    UpdatedAt,
    Name,
    Locality,
    State,
    Source,
    Priority,
    QuotedAmount,
    SaleAmount,
    SaleDate,
    CommissionAmount,
}

impl LeadSortField {
    /// Aceita o nome camelCase da resposta e o nome espanhol usado no painel.
    pub fn parse(s: &str) -> Option<Self> {
        let field = match s {
            "id" => LeadSortField::Id,
            "createdAt" => LeadSortField::CreatedAt,
            "updatedAt" => LeadSortField::UpdatedAt,
            "name" | "nombre" => LeadSortField::Name,
            "locality" | "localidad" => LeadSortField::Locality,
            "state" | "estado" => LeadSortField::State,
            "source" | "fuente" => LeadSortField::Source,
            "priority" | "prioridad" => LeadSortField::Priority,
            "quotedAmount" | "presupuestoEnviado" => LeadSortField::QuotedAmount,
            "saleAmount" | "importeVenta" => LeadSortField::SaleAmount,
            "saleDate" | "fechaVenta" => LeadSortField::SaleDate,
            "commissionAmount" | "comisionCalculada" => LeadSortField::CommissionAmount,
            _ => return None,
        };
        Some(field)
    }

    pub fn column(self) -> &'static str {
        match self {
            LeadSortField::Id => "l.id",
            LeadSortField::CreatedAt => "l.created_at",
            LeadSortField::UpdatedAt => "l.updated_at",
            LeadSortField::Name => "l.name",
            LeadSortField::Locality => "l.locality",
            LeadSortField::State => "l.state",
            LeadSortField::Source => "l.source",
            LeadSortField::Priority => "l.priority",
            LeadSortField::QuotedAmount => "l.quoted_amount",
            LeadSortField::SaleAmount => "l.sale_amount",
            LeadSortField::SaleDate => "l.sale_date",
            LeadSortField::CommissionAmount => "l.commission_amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadSort {
    pub field: LeadSortField,
    pub direction: SortDirection,
}

impl Default for LeadSort {
    fn default() -> Self {
        Self {
            field: LeadSortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub states: Vec<LeadState>,
    pub sources: Vec<LeadSource>,
    pub priority: Option<LeadPriority>,
    pub landing_id: Option<i64>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_its_wire_name() {
        for state in LeadState::ALL {
            assert_eq!(state.as_str().parse::<LeadState>().unwrap(), state);
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }

    #[test]
    fn unknown_state_is_an_invalid_argument() {
        let err = "cerrado".parse::<LeadState>().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument("invalid_state")));
    }

    #[test]
    fn unknown_priority_is_an_invalid_argument() {
        let err = "maxima".parse::<LeadPriority>().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument("invalid_priority")));
    }

    #[test]
    fn revised_quote_keeps_the_first_quote_date() {
        let mut lead = crate::services::pipeline_service::tests::sample_lead(LeadState::Meeting);
        let first = Utc::now();
        lead.record_quote(rust_decimal_macros::dec!(1500), first);
        lead.record_quote(rust_decimal_macros::dec!(1400), first + chrono::Duration::days(3));

        assert_eq!(lead.quoted_amount, Some(rust_decimal_macros::dec!(1400)));
        assert_eq!(lead.quote_date, Some(first));
    }

    #[test]
    fn manual_creation_cannot_claim_landing_source() {
        let contact = LeadContact {
            name: "Ana".into(),
            phone: "611222333".into(),
            ..Default::default()
        };
        let err = NewLead::manual(contact.clone(), LeadSource::Landing, LeadPriority::Medium).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let ok = NewLead::manual(contact, LeadSource::Referral, LeadPriority::High).unwrap();
        assert_eq!(ok.source(), LeadSource::Referral);
        assert!(ok.origin().is_none());
    }

    #[test]
    fn phone_whitespace_is_stripped_before_validation() {
        let submission = LeadSubmission {
            nombre: "  Ana ".into(),
            telefono: "611 22\t23 33".into(),
            email: Some("   ".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(submission.nombre, "Ana");
        assert_eq!(submission.telefono, "611222333");
        assert_eq!(submission.email, None);
        assert!(submission.validate().is_ok());
    }

    #[test]
    fn short_phone_fails_after_normalization() {
        let submission = LeadSubmission {
            nombre: "Ana".into(),
            telefono: "611 222 33".into(),
            ..Default::default()
        }
        .normalized();

        let errors = submission.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("telefono"));
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let submission = LeadSubmission {
            nombre: "A".into(),
            telefono: "1".into(),
            email: Some("no-es-email".into()),
            ..Default::default()
        }
        .normalized();

        let errors = submission.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 3);
        assert!(fields.contains_key("nombre"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn email_longer_than_the_column_is_reported() {
        let label = "b".repeat(60);
        let submission = LeadSubmission {
            nombre: "Ana García".into(),
            telefono: "611222333".into(),
            email: Some(format!("{}@{label}.{label}.{label}.{label}.com", "a".repeat(60))),
            ..Default::default()
        }
        .normalized();

        let errors = submission.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn sort_field_accepts_both_naming_styles() {
        assert_eq!(LeadSortField::parse("importeVenta"), Some(LeadSortField::SaleAmount));
        assert_eq!(LeadSortField::parse("saleAmount"), Some(LeadSortField::SaleAmount));
        assert_eq!(LeadSortField::parse("password; DROP TABLE"), None);
    }

    #[test]
    fn sort_direction_is_case_insensitive() {
        assert_eq!(SortDirection::parse("ASC"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("sideways"), None);
    }
}
