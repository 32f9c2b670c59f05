// src/services/report_service.rs

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::{db_utils::day_range, error::AppError},
    db::ReportRepository,
    models::{
        expense::ExpenseFilter,
        reports::{BalanceReport, BalanceTotals, DashboardReport},
    },
    services::expense_service::ExpenseService,
};

pub const DEFAULT_PERIOD_DAYS: u32 = 30;
pub const MAX_PERIOD_DAYS: u32 = 365;

pub fn check_period(days: Option<u32>) -> Result<u32, AppError> {
    let days = days.unwrap_or(DEFAULT_PERIOD_DAYS);
    if !(1..=MAX_PERIOD_DAYS).contains(&days) {
        return Err(AppError::validation(
            "periodo",
            "range",
            "El periodo debe estar entre 1 y 365 días",
        ));
    }
    Ok(days)
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    expenses: ExpenseService,
}

impl ReportService {
    pub fn new(repo: ReportRepository, expenses: ExpenseService) -> Self {
        Self { repo, expenses }
    }

    /// Vendas ganhas, comissões e gastos do intervalo (datas inclusivas).
    pub async fn balance<'e, E>(
        &self,
        executor: E,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<BalanceReport, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let (start, end) = day_range(from, to);

        let mut conn = executor.acquire().await?;
        let won = self.repo.won_leads(&mut *conn, start, end).await?;
        let monthly = self.repo.monthly_sales(&mut *conn).await?;

        let gastos = self
            .expenses
            .summary(&ExpenseFilter {
                spent_from: start,
                spent_before: end,
                ..Default::default()
            })
            .await?;

        Ok(BalanceReport {
            totals: BalanceTotals::from_entries(&won, gastos.total),
            gastos,
            ventas_mensuales: monthly,
            leads_ganados: won,
        })
    }

    pub async fn dashboard<'e, E>(&self, executor: E, period_days: Option<u32>) -> Result<DashboardReport, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let days = check_period(period_days)?;
        let since = Utc::now() - Duration::days(i64::from(days));

        let (kpis, por_estado, por_fuente, por_landing) = self.repo.dashboard(executor, since).await?;

        Ok(DashboardReport {
            periodo: days,
            kpis,
            por_estado,
            por_fuente,
            por_landing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_defaults_to_thirty_days() {
        assert_eq!(check_period(None).unwrap(), 30);
    }

    #[test]
    fn period_outside_range_is_rejected() {
        assert!(check_period(Some(0)).is_err());
        assert!(check_period(Some(366)).is_err());
        assert_eq!(check_period(Some(365)).unwrap(), 365);
    }
}
