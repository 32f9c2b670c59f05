// src/models/reports.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::expense::ExpenseSummary;

// =============================================================================
//  BALANÇO
// =============================================================================

/// Lead ganho dentro do período do balanço.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WonLeadEntry {
    pub id: i64,
    pub name: String,
    pub locality: Option<String>,
    pub sale_amount: Option<Decimal>,
    pub sale_date: Option<DateTime<Utc>>,
    pub commission_amount: Option<Decimal>,
    pub commission_paid: bool,
    pub landing_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    #[schema(example = "2025-03")]
    pub month: String,
    pub sales_count: i64,
    pub total_sales: Decimal,
    pub total_commissions: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceTotals {
    pub total_ventas: Decimal,
    pub total_comisiones: Decimal,
    pub comisiones_pagadas: Decimal,
    pub comisiones_pendientes: Decimal,
    pub total_gastos: Decimal,
    pub balance: Decimal,
    pub balance_neto: Decimal,
}

impl BalanceTotals {
    /// Consolida os totais a partir dos leads ganhos e do total de gastos.
    pub fn from_entries(won: &[WonLeadEntry], total_gastos: Decimal) -> Self {
        let mut totals = BalanceTotals {
            total_gastos,
            ..Default::default()
        };

        for entry in won {
            totals.total_ventas += entry.sale_amount.unwrap_or_default();
            let commission = entry.commission_amount.unwrap_or_default();
            totals.total_comisiones += commission;
            if entry.commission_paid {
                totals.comisiones_pagadas += commission;
            } else {
                totals.comisiones_pendientes += commission;
            }
        }

        totals.balance = totals.total_comisiones - totals.total_gastos;
        totals.balance_neto = totals.comisiones_pendientes - totals.total_gastos;
        totals
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub totals: BalanceTotals,
    pub gastos: ExpenseSummary,
    pub ventas_mensuales: Vec<MonthlySales>,
    pub leads_ganados: Vec<WonLeadEntry>,
}

// =============================================================================
//  DASHBOARD
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub total_leads: i64,
    pub leads_in_period: i64,
    pub won_count: i64,
    pub revenue: Decimal,
    pub commissions: Decimal,
    /// Soma dos orçamentos de leads ainda abertos.
    pub pipeline_value: Decimal,
    #[schema(example = "12.5")]
    pub conversion_rate: Decimal,
}

/// Contagem agrupada (por estado, fonte ou landing).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountEntry {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub periodo: u32,
    pub kpis: DashboardKpis,
    pub por_estado: Vec<CountEntry>,
    pub por_fuente: Vec<CountEntry>,
    pub por_landing: Vec<CountEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(sale: Decimal, commission: Decimal, paid: bool) -> WonLeadEntry {
        WonLeadEntry {
            id: 1,
            name: "Ana".into(),
            locality: None,
            sale_amount: Some(sale),
            sale_date: Some(Utc::now()),
            commission_amount: Some(commission),
            commission_paid: paid,
            landing_name: None,
        }
    }

    #[test]
    fn totals_split_paid_and_pending_commissions() {
        let won = vec![
            entry(dec!(1000), dec!(100), true),
            entry(dec!(500), dec!(50), false),
        ];
        let totals = BalanceTotals::from_entries(&won, dec!(30));

        assert_eq!(totals.total_ventas, dec!(1500));
        assert_eq!(totals.total_comisiones, dec!(150));
        assert_eq!(totals.comisiones_pagadas, dec!(100));
        assert_eq!(totals.comisiones_pendientes, dec!(50));
        assert_eq!(totals.balance, dec!(120));
        assert_eq!(totals.balance_neto, dec!(20));
    }

    #[test]
    fn no_sales_leaves_a_negative_balance() {
        let totals = BalanceTotals::from_entries(&[], dec!(80));
        assert_eq!(totals.balance, dec!(-80));
        assert_eq!(totals.balance_neto, dec!(-80));
    }
}
