use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

/// Entidades que podem ser buscadas por id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Lead,
    Landing,
    Expense,
}

impl Resource {
    fn message_key(self) -> &'static str {
        match self {
            Resource::Lead => "not_found.lead",
            Resource::Landing => "not_found.landing",
            Resource::Expense => "not_found.expense",
        }
    }
}

// Os `&'static str` das variantes são chaves do catálogo de mensagens (I18nStore).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:?} não encontrado")]
    NotFound(Resource),

    // Mesma resposta para chave inexistente e landing inativa
    #[error("API Key inválida ou landing inativa")]
    Unauthorized,

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Transição inválida: {0}")]
    InvalidTransition(&'static str),

    #[error("Argumento inválido: {0}")]
    InvalidArgument(&'static str),

    #[error("Conflito: {0}")]
    Conflict(&'static str),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Erro de validação de um único campo, no mesmo formato do `validator`.
    pub fn validation(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.into());
        errors.add(field, err);
        AppError::ValidationError(errors)
    }

    /// Identificador estável do tipo de erro, devolvido no campo `code`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::ValidationError(_) => "validation_error",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Conflict(_) => "conflict",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let code = self.kind();

        let (status, key) = match &self {
            AppError::ValidationError(errors) => {
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    code,
                    error: store.translate(lang, "validation_error"),
                    details: Some(validation_details(errors)),
                };
            }
            AppError::NotFound(resource) => (StatusCode::NOT_FOUND, resource.message_key()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidTransition(key) => (StatusCode::BAD_REQUEST, *key),
            AppError::InvalidArgument(key) => (StatusCode::BAD_REQUEST, *key),
            AppError::Conflict(key) => (StatusCode::CONFLICT, *key),

            // Banco e erros inesperados viram 500. O detalhe só vai para o log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        ApiError {
            status,
            code,
            error: store.translate(lang, key),
            details: None,
        }
    }
}

/// Um item por campo inválido, ordenado pelo nome do campo.
fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let message = field_errors
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .or_else(|| field_errors.first().map(|e| e.code.to_string()))
                .unwrap_or_default();
            (field.to_string(), message)
        })
        .collect();
    fields.sort();

    Value::Array(
        fields
            .into_iter()
            .map(|(field, message)| json!({ "field": field, "message": message }))
            .collect(),
    )
}

// Erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es() -> Locale {
        Locale("es".to_string())
    }

    #[test]
    fn not_found_maps_to_404() {
        let api = AppError::NotFound(Resource::Lead).to_api_error(&es(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.code, "not_found");
        assert_eq!(api.error, "Lead no encontrado");
    }

    #[test]
    fn unauthorized_carries_no_details() {
        let api = AppError::Unauthorized.to_api_error(&es(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_error_lists_one_entry_per_field() {
        let mut errors = validator::ValidationErrors::new();
        let mut a = validator::ValidationError::new("length");
        a.message = Some("Nombre muy corto".into());
        let b = validator::ValidationError::new("length");
        errors.add("nombre", a);
        errors.add("nombre", b);
        errors.add("telefono", validator::ValidationError::new("length"));

        let api = AppError::ValidationError(errors).to_api_error(&es(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let details = api.details.unwrap();
        let details = details.as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0]["field"], "nombre");
        assert_eq!(details[0]["message"], "Nombre muy corto");
        assert_eq!(details[1]["field"], "telefono");
        assert_eq!(details[1]["message"], "length");
    }

    #[test]
    fn internal_errors_do_not_leak_the_cause() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection refused on 10.0.0.3"));
        let api = err.to_api_error(&Locale("en".to_string()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("10.0.0.3"));
    }

    #[test]
    fn conflict_maps_to_409() {
        let api = AppError::Conflict("landing_slug_taken").to_api_error(&es(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::CONFLICT);
    }
}
