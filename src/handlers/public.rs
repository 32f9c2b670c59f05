// src/handlers/public.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        client::{ApiKey, ClientInfo},
        i18n::Locale,
    },
    models::lead::LeadSubmission,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub lead_id: i64,
    #[schema(example = "Lead recibido correctamente")]
    pub message: String,
}

// POST /api/public/leads
#[utoipa::path(
    post,
    path = "/api/public/leads",
    tag = "Público",
    request_body = LeadSubmission,
    params(("X-API-Key" = String, Header, description = "API Key da landing")),
    responses(
        (status = 201, description = "Lead recebido", body = IngestResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "API Key inválida ou landing inativa")
    )
)]
pub async fn ingest_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiKey(api_key): ApiKey,
    client: ClientInfo,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    // A chave é conferida antes do corpo, mesmo quando o JSON é inválido
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            app_state
                .ingestion_service
                .authenticate(&app_state.db_pool, api_key.as_deref())
                .await
                .map_err(to_api)?;
            tracing::debug!(error = %rejection.body_text(), "Corpo inválido na ingestão pública");
            return Err(to_api(AppError::validation(
                "body",
                "json",
                "El cuerpo de la petición no es un JSON válido",
            )));
        }
    };

    let lead = app_state
        .ingestion_service
        .ingest(&app_state.db_pool, api_key.as_deref(), submission, client)
        .await
        .map_err(to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            lead_id: lead.id,
            message: "Lead recibido correctamente".to_string(),
        }),
    ))
}
