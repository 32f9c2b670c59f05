// src/handlers/leads.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{
        db_utils::day_range,
        error::{ApiError, AppError},
        pagination::{PageRequest, Pagination},
        serde_utils::double_option,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::lead::{
        Lead, LeadChanges, LeadContact, LeadDetail, LeadFilter, LeadListItem, LeadPriority, LeadSort,
        LeadSortField, LeadSource, LeadState, NewLead, SortDirection, non_blank, normalize_phone,
    },
    services::{
        bulk_service::{BulkAction, BulkOutcome},
        pipeline_service::TransitionOptions,
    },
};

/// Tamanho da coluna `leads.email`.
const MAX_EMAIL_LEN: usize = 255;

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 2, max = 255, message = "El nombre debe tener entre 2 y 255 caracteres"))]
    #[schema(example = "Ana García")]
    pub nombre: String,

    #[validate(length(min = 9, max = 20, message = "El teléfono debe tener entre 9 y 20 caracteres"))]
    #[schema(example = "611222333")]
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

    /// Padrão `directo`. `landing` é recusado.
    pub fuente: Option<LeadSource>,
    /// Padrão `media`.
    pub prioridad: Option<LeadPriority>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 2, max = 255, message = "El nombre debe tener entre 2 y 255 caracteres"))]
    pub nombre: Option<String>,

    #[validate(length(min = 9, max = 20, message = "El teléfono debe tener entre 9 y 20 caracteres"))]
    pub telefono: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub localidad: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub direccion: Option<Option<String>>,
    pub servicios: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notas: Option<Option<String>>,

    pub fuente: Option<LeadSource>,
    pub prioridad: Option<LeadPriority>,

    /// `null` limpa o orçamento e a data.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub presupuesto_enviado: Option<Option<Decimal>>,
    /// `null` limpa venda, data e comissão.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub importe_venta: Option<Option<Decimal>>,
    pub comision_pagada: Option<bool>,
}

impl UpdateLeadPayload {
    fn normalized(mut self) -> Self {
        self.nombre = self.nombre.map(|n| n.trim().to_string());
        self.telefono = self.telefono.map(|t| normalize_phone(&t));
        self.email = self.email.map(non_blank);
        self
    }

    /// Validação do email quando presente (o derive não enxerga `Option<Option<_>>`).
    fn check_email(&self) -> Result<(), AppError> {
        if let Some(Some(email)) = &self.email {
            if !validator::ValidateEmail::validate_email(email) {
                return Err(AppError::validation("email", "email", "Email inválido"));
            }
            if email.chars().count() > MAX_EMAIL_LEN {
                return Err(AppError::validation(
                    "email",
                    "length",
                    "El email no puede superar 255 caracteres",
                ));
            }
        }
        Ok(())
    }

    fn into_changes(self) -> LeadChanges {
        LeadChanges {
            name: self.nombre,
            phone: self.telefono,
            email: self.email,
            locality: self.localidad.map(non_blank),
            address: self.direccion.map(non_blank),
            services: self.servicios,
            notes: self.notas.map(non_blank),
            source: self.fuente,
            priority: self.prioridad,
            quoted_amount: self.presupuesto_enviado,
            sale_amount: self.importe_venta,
            commission_paid: self.comision_pagada,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatePayload {
    #[schema(example = "ganado")]
    pub estado: String,
    pub nota: Option<String>,
    #[schema(value_type = Option<f64>, example = 1000)]
    pub importe_venta: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkPayload {
    #[schema(example = json!([1, 2, 3]))]
    pub ids: Vec<i64>,
    #[schema(example = "updateState")]
    pub action: String,
    #[schema(example = "contactado")]
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeadsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Lista separada por vírgula
    pub estado: Option<String>,
    /// Lista separada por vírgula
    pub fuente: Option<String>,
    pub prioridad: Option<String>,
    pub landing_id: Option<i64>,
    pub buscar: Option<String>,
    #[param(value_type = Option<String>, example = "2025-03-01")]
    pub fecha_desde: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2025-03-31")]
    pub fecha_hasta: Option<NaiveDate>,
    pub orden: Option<String>,
    pub direccion: Option<String>,
}

impl ListLeadsQuery {
    fn filter(&self) -> Result<LeadFilter, AppError> {
        let (created_from, created_before) = day_range(self.fecha_desde, self.fecha_hasta);
        Ok(LeadFilter {
            states: parse_csv(self.estado.as_deref())?,
            sources: parse_csv(self.fuente.as_deref())?,
            priority: self
                .prioridad
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(str::parse)
                .transpose()?,
            landing_id: self.landing_id,
            search: self.buscar.clone(),
            created_from,
            created_before,
        })
    }

    fn sort(&self) -> Result<LeadSort, AppError> {
        let mut sort = LeadSort::default();
        if let Some(orden) = self.orden.as_deref().filter(|o| !o.is_empty()) {
            sort.field = LeadSortField::parse(orden).ok_or(AppError::InvalidArgument("invalid_sort"))?;
        }
        if let Some(direccion) = self.direccion.as_deref().filter(|d| !d.is_empty()) {
            sort.direction = SortDirection::parse(direccion).ok_or(AppError::InvalidArgument("invalid_sort"))?;
        }
        Ok(sort)
    }
}

fn parse_csv<T>(raw: Option<&str>) -> Result<Vec<T>, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadListResponse {
    pub leads: Vec<LeadListItem>,
    pub pagination: Pagination,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(ListLeadsQuery),
    responses(
        (status = 200, description = "Página de leads", body = LeadListResponse),
        (status = 400, description = "Filtro inválido")
    )
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListLeadsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let filter = query.filter().map_err(to_api)?;
    let sort = query.sort().map_err(to_api)?;
    let page = PageRequest::clamped(
        query.page,
        query.limit,
        app_state.config.default_page_size,
        app_state.config.max_page_size,
    );

    let (leads, pagination) = app_state
        .lead_service
        .list(&filter, sort, page)
        .await
        .map_err(to_api)?;

    Ok(Json(LeadListResponse { leads, pagination }))
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(mut payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.nombre = payload.nombre.trim().to_string();
    payload.telefono = normalize_phone(&payload.telefono);
    payload.email = non_blank(payload.email);
    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let contact = LeadContact {
        name: payload.nombre,
        phone: payload.telefono,
        email: payload.email,
        locality: non_blank(payload.localidad),
        address: non_blank(payload.direccion),
        services: payload.servicios,
        notes: non_blank(payload.notas),
    };
    let new_lead = NewLead::manual(
        contact,
        payload.fuente.unwrap_or(LeadSource::Direct),
        payload.prioridad.unwrap_or_default(),
    )
    .map_err(to_api)?;

    let lead = app_state
        .lead_service
        .create_manual(&app_state.db_pool, new_lead)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = i64, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead com landing e atividades recentes", body = LeadDetail),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .lead_service
        .get_detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

// PUT /api/leads/{id}
#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = i64, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let payload = payload.normalized();
    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;
    payload.check_email().map_err(to_api)?;

    let lead = app_state
        .lead_service
        .update(&app_state.db_pool, id, payload.into_changes())
        .await
        .map_err(to_api)?;

    Ok(Json(lead))
}

// DELETE /api/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = i64, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead e atividades removidos"),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(json!({ "success": true })))
}

// PUT /api/leads/{id}/estado
#[utoipa::path(
    put,
    path = "/api/leads/{id}/estado",
    tag = "Pipeline",
    params(("id" = i64, Path, description = "ID do lead")),
    request_body = ChangeStatePayload,
    responses(
        (status = 200, description = "Lead na nova etapa", body = Lead),
        (status = 400, description = "Estado inválido ou venda sem importe"),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn change_state(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    Json(payload): Json<ChangeStatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let target: LeadState = payload.estado.trim().parse().map_err(to_api)?;
    let options = TransitionOptions {
        sale_amount: payload.importe_venta,
        note: payload.nota,
        commission_rate: None,
    };

    let lead = app_state
        .pipeline_service
        .transition(&app_state.db_pool, id, target, options)
        .await
        .map_err(to_api)?;

    Ok(Json(lead))
}

// POST /api/leads/bulk
#[utoipa::path(
    post,
    path = "/api/leads/bulk",
    tag = "Leads",
    request_body = BulkPayload,
    responses(
        (status = 200, description = "Ação aplicada", body = BulkOutcome),
        (status = 400, description = "Ação, valor ou ids inválidos")
    )
)]
pub async fn bulk_action(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<BulkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let action = BulkAction::parse(&payload.action, payload.value.as_deref()).map_err(to_api)?;
    let outcome = app_state
        .bulk_service
        .apply(&app_state.db_pool, &payload.ids, action)
        .await
        .map_err(to_api)?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_email() -> String {
        let label = "b".repeat(60);
        format!("{}@{label}.{label}.{label}.{label}.com", "a".repeat(60))
    }

    #[test]
    fn csv_filters_are_parsed_into_enums() {
        let query = ListLeadsQuery {
            estado: Some("nuevo, contactado".into()),
            fuente: Some("landing".into()),
            prioridad: Some("alta".into()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.states, vec![LeadState::New, LeadState::Contacted]);
        assert_eq!(filter.sources, vec![LeadSource::Landing]);
        assert_eq!(filter.priority, Some(LeadPriority::High));
    }

    #[test]
    fn unknown_state_in_filter_is_rejected() {
        let query = ListLeadsQuery {
            estado: Some("nuevo,cerrado".into()),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(AppError::InvalidArgument("invalid_state"))));
    }

    #[test]
    fn sort_defaults_to_newest_first() {
        let sort = ListLeadsQuery::default().sort().unwrap();
        assert_eq!(sort, LeadSort::default());

        let query = ListLeadsQuery {
            orden: Some("importeVenta".into()),
            direccion: Some("asc".into()),
            ..Default::default()
        };
        let sort = query.sort().unwrap();
        assert_eq!(sort.field, LeadSortField::SaleAmount);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn update_payload_distinguishes_null_from_absent() {
        let payload: UpdateLeadPayload =
            serde_json::from_str(r#"{"importeVenta": null, "telefono": "611 222 333"}"#).unwrap();
        let payload = payload.normalized();
        assert_eq!(payload.telefono.as_deref(), Some("611222333"));

        let changes = payload.into_changes();
        assert_eq!(changes.sale_amount, Some(None));
        assert_eq!(changes.quoted_amount, None);
    }

    #[test]
    fn overlong_email_is_reported_on_create_and_update() {
        let email = long_email();
        assert!(email.len() > MAX_EMAIL_LEN);

        let payload = CreateLeadPayload {
            nombre: "Ana García".into(),
            telefono: "611222333".into(),
            email: Some(email.clone()),
            localidad: None,
            direccion: None,
            servicios: vec![],
            notas: None,
            fuente: None,
            prioridad: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let payload: UpdateLeadPayload = serde_json::from_value(json!({ "email": email })).unwrap();
        let err = payload.normalized().check_email().unwrap_err();
        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação");
        };
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn invalid_email_on_update_is_reported() {
        let payload: UpdateLeadPayload = serde_json::from_str(r#"{"email": "nope"}"#).unwrap();
        assert!(payload.normalized().check_email().is_err());
    }
}
