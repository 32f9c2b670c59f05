// src/handlers/activities.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::activity::{Activity, ActivityKind},
};

const DEFAULT_ACTIVITY_LIMIT: u32 = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateActivityPayload {
    /// nota, llamada, email, reunion, whatsapp, presupuesto_enviado ou presupuesto_actualizado
    pub tipo: ActivityKind,
    #[schema(example = "Llamada para concretar visita")]
    pub descripcion: String,
    /// Em orçamentos, `importe` também atualiza o lead.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityListQuery {
    pub limit: Option<u32>,
}

// GET /api/leads/{id}/actividad
#[utoipa::path(
    get,
    path = "/api/leads/{id}/actividad",
    tag = "Actividad",
    params(("id" = i64, Path, description = "ID do lead"), ActivityListQuery),
    responses(
        (status = 200, description = "Histórico, mais recentes primeiro", body = Vec<Activity>),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn list_activities(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<i64>,
    Query(query): Query<ActivityListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, app_state.config.max_page_size);

    let activities = app_state
        .activity_service
        .list_for_lead(&app_state.db_pool, lead_id, limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(activities))
}

// POST /api/leads/{id}/actividad
#[utoipa::path(
    post,
    path = "/api/leads/{id}/actividad",
    tag = "Actividad",
    params(("id" = i64, Path, description = "ID do lead")),
    request_body = CreateActivityPayload,
    responses(
        (status = 201, description = "Atividade registrada", body = Activity),
        (status = 400, description = "Tipo reservado ou dados inválidos"),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn create_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(lead_id): Path<i64>,
    Json(payload): Json<CreateActivityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = app_state
        .activity_service
        .record(
            &app_state.db_pool,
            lead_id,
            payload.tipo,
            &payload.descripcion,
            payload.metadata,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(activity)))
}
