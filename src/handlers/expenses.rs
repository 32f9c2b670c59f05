// src/handlers/expenses.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
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
    models::{
        expense::{Expense, ExpenseChanges, ExpenseFilter, ExpenseKind, ExpenseSummary, NewExpense},
        lead::non_blank,
    },
};

const DEFAULT_EXPENSE_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpensePayload {
    pub tipo: ExpenseKind,

    #[validate(length(min = 2, max = 255, message = "El concepto debe tener entre 2 y 255 caracteres"))]
    #[schema(example = "Campaña Google Ads marzo")]
    pub concepto: String,

    #[schema(example = "250.00")]
    pub importe: Decimal,
    /// Padrão: agora.
    pub fecha: Option<DateTime<Utc>>,
    pub notas: Option<String>,
    pub landing_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpensePayload {
    pub tipo: Option<ExpenseKind>,

    #[validate(length(min = 2, max = 255, message = "El concepto debe tener entre 2 y 255 caracteres"))]
    pub concepto: Option<String>,
    pub importe: Option<Decimal>,
    pub fecha: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notas: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub landing_id: Option<Option<i64>>,
}

impl UpdateExpensePayload {
    fn into_changes(self) -> ExpenseChanges {
        ExpenseChanges {
            kind: self.tipo,
            concept: self.concepto.map(|c| c.trim().to_string()),
            amount: self.importe,
            spent_at: self.fecha,
            notes: self.notas.map(non_blank),
            landing_id: self.landing_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListExpensesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub tipo: Option<ExpenseKind>,
    pub landing_id: Option<i64>,
    #[param(value_type = Option<String>, example = "2025-03-01")]
    pub fecha_desde: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2025-03-31")]
    pub fecha_hasta: Option<NaiveDate>,
}

impl ListExpensesQuery {
    fn filter(&self) -> ExpenseFilter {
        let (spent_from, spent_before) = day_range(self.fecha_desde, self.fecha_hasta);
        ExpenseFilter {
            kind: self.tipo,
            landing_id: self.landing_id,
            spent_from,
            spent_before,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseListResponse {
    pub gastos: Vec<Expense>,
    pub pagination: Pagination,
    pub resumen: ExpenseSummary,
}

// GET /api/gastos
#[utoipa::path(
    get,
    path = "/api/gastos",
    tag = "Gastos",
    params(ListExpensesQuery),
    responses((status = 200, description = "Página de gastos com resumo do filtro", body = ExpenseListResponse))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListExpensesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::clamped(
        query.page,
        query.limit,
        DEFAULT_EXPENSE_PAGE_SIZE.min(app_state.config.max_page_size),
        app_state.config.max_page_size,
    );

    let (gastos, pagination, resumen) = app_state
        .expense_service
        .list(&query.filter(), page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ExpenseListResponse {
        gastos,
        pagination,
        resumen,
    }))
}

// POST /api/gastos
#[utoipa::path(
    post,
    path = "/api/gastos",
    tag = "Gastos",
    request_body = CreateExpensePayload,
    responses(
        (status = 201, description = "Gasto registrado", body = Expense),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Landing não encontrada")
    )
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let new_expense = NewExpense {
        kind: payload.tipo,
        concept: payload.concepto.trim().to_string(),
        amount: payload.importe,
        spent_at: payload.fecha,
        notes: non_blank(payload.notas),
        landing_id: payload.landing_id,
    };

    let expense = app_state
        .expense_service
        .create(&app_state.db_pool, new_expense)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

// GET /api/gastos/{id}
#[utoipa::path(
    get,
    path = "/api/gastos/{id}",
    tag = "Gastos",
    params(("id" = i64, Path, description = "ID do gasto")),
    responses(
        (status = 200, description = "Gasto", body = Expense),
        (status = 404, description = "Gasto não encontrado")
    )
)]
pub async fn get_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = app_state
        .expense_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(expense))
}

// PUT /api/gastos/{id}
#[utoipa::path(
    put,
    path = "/api/gastos/{id}",
    tag = "Gastos",
    params(("id" = i64, Path, description = "ID do gasto")),
    request_body = UpdateExpensePayload,
    responses(
        (status = 200, description = "Gasto atualizado", body = Expense),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Gasto não encontrado")
    )
)]
pub async fn update_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let expense = app_state
        .expense_service
        .update(&app_state.db_pool, id, payload.into_changes())
        .await
        .map_err(to_api)?;

    Ok(Json(expense))
}

// DELETE /api/gastos/{id}
#[utoipa::path(
    delete,
    path = "/api/gastos/{id}",
    tag = "Gastos",
    params(("id" = i64, Path, description = "ID do gasto")),
    responses(
        (status = 200, description = "Gasto removido"),
        (status = 404, description = "Gasto não encontrado")
    )
)]
pub async fn delete_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .expense_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(json!({ "success": true })))
}
