// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::reports::{BalanceReport, DashboardReport},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BalanceQuery {
    #[param(value_type = Option<String>, example = "2025-01-01")]
    pub fecha_desde: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2025-12-31")]
    pub fecha_hasta: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Dias (1 a 365, padrão 30)
    pub periodo: Option<u32>,
}

// GET /api/balance
#[utoipa::path(
    get,
    path = "/api/balance",
    tag = "Informes",
    params(BalanceQuery),
    responses((status = 200, description = "Vendas, comissões e gastos do intervalo", body = BalanceReport))
)]
pub async fn get_balance(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<BalanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .balance(&app_state.db_pool, query.fecha_desde, query.fecha_hasta)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Informes",
    params(DashboardQuery),
    responses(
        (status = 200, description = "KPIs e distribuições do período", body = DashboardReport),
        (status = 400, description = "Período inválido")
    )
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .dashboard(&app_state.db_pool, query.periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
