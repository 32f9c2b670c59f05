// src/handlers/landings.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        serde_utils::double_option,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        landing::{Landing, LandingChanges, LandingWithCount, NewLanding},
        lead::non_blank,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLandingPayload {
    #[validate(length(min = 2, max = 100, message = "El nombre debe tener entre 2 y 100 caracteres"))]
    #[schema(example = "Solutec - Ventanas")]
    pub nombre: String,

    #[validate(length(min = 2, max = 50, message = "El slug debe tener entre 2 y 50 caracteres"))]
    #[schema(example = "ventanas")]
    pub slug: String,

    #[validate(url(message = "URL inválida"))]
    pub url: Option<String>,
    pub descripcion: Option<String>,
    pub notificar_email: Option<bool>,
    pub notificar_push: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLandingPayload {
    #[validate(length(min = 2, max = 100, message = "El nombre debe tener entre 2 y 100 caracteres"))]
    pub nombre: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub descripcion: Option<Option<String>>,
    pub activa: Option<bool>,
    pub notificar_email: Option<bool>,
    pub notificar_push: Option<bool>,
}

impl UpdateLandingPayload {
    fn check_url(&self) -> Result<(), AppError> {
        if let Some(Some(url)) = &self.url {
            if !validator::ValidateUrl::validate_url(url) {
                return Err(AppError::validation("url", "url", "URL inválida"));
            }
        }
        Ok(())
    }
}

// GET /api/landings
#[utoipa::path(
    get,
    path = "/api/landings",
    tag = "Landings",
    responses((status = 200, description = "Landings com total de leads", body = Vec<LandingWithCount>))
)]
pub async fn list_landings(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let landings = app_state
        .landing_service
        .list(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(landings))
}

// POST /api/landings
#[utoipa::path(
    post,
    path = "/api/landings",
    tag = "Landings",
    request_body = CreateLandingPayload,
    responses(
        (status = 201, description = "Landing criada com API Key", body = Landing),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Slug já existe")
    )
)]
pub async fn create_landing(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateLandingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let new_landing = NewLanding {
        name: payload.nombre.trim().to_string(),
        slug: payload.slug.trim().to_string(),
        url: non_blank(payload.url),
        description: non_blank(payload.descripcion),
        notify_email: payload.notificar_email.unwrap_or(true),
        notify_push: payload.notificar_push.unwrap_or(true),
    };

    let landing = app_state
        .landing_service
        .create(&app_state.db_pool, new_landing)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(landing)))
}

// GET /api/landings/{id}
#[utoipa::path(
    get,
    path = "/api/landings/{id}",
    tag = "Landings",
    params(("id" = i64, Path, description = "ID da landing")),
    responses(
        (status = 200, description = "Landing", body = Landing),
        (status = 404, description = "Landing não encontrada")
    )
)]
pub async fn get_landing(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let landing = app_state
        .landing_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(landing))
}

// PUT /api/landings/{id}
#[utoipa::path(
    put,
    path = "/api/landings/{id}",
    tag = "Landings",
    params(("id" = i64, Path, description = "ID da landing")),
    request_body = UpdateLandingPayload,
    responses(
        (status = 200, description = "Landing atualizada", body = Landing),
        (status = 404, description = "Landing não encontrada")
    )
)]
pub async fn update_landing(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLandingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;
    payload.check_url().map_err(to_api)?;

    let changes = LandingChanges {
        name: payload.nombre.map(|n| n.trim().to_string()),
        url: payload.url.map(non_blank),
        description: payload.descripcion.map(non_blank),
        active: payload.activa,
        notify_email: payload.notificar_email,
        notify_push: payload.notificar_push,
    };

    let landing = app_state
        .landing_service
        .update(&app_state.db_pool, id, changes)
        .await
        .map_err(to_api)?;

    Ok(Json(landing))
}

// DELETE /api/landings/{id}
#[utoipa::path(
    delete,
    path = "/api/landings/{id}",
    tag = "Landings",
    params(("id" = i64, Path, description = "ID da landing")),
    responses(
        (status = 200, description = "Landing removida; os leads ficam sem landing"),
        (status = 404, description = "Landing não encontrada")
    )
)]
pub async fn delete_landing(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .landing_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(json!({ "success": true })))
}

// POST /api/landings/{id}/regenerate-key
#[utoipa::path(
    post,
    path = "/api/landings/{id}/regenerate-key",
    tag = "Landings",
    params(("id" = i64, Path, description = "ID da landing")),
    responses(
        (status = 200, description = "Landing com a nova API Key", body = Landing),
        (status = 404, description = "Landing não encontrada")
    )
)]
pub async fn regenerate_key(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let landing = app_state
        .landing_service
        .regenerate_key(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(landing))
}
