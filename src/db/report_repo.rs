// src/db/report_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    models::reports::{CountEntry, DashboardKpis, MonthlySales, WonLeadEntry},
};

/// Consultas agregadas do balanço e do dashboard. Somente leitura.
#[derive(Clone, Default)]
pub struct ReportRepository;

impl ReportRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  BALANÇO
    // =========================================================================

    /// Leads ganhos com venda dentro de [from, before).
    pub async fn won_leads<'e, E>(
        &self,
        executor: E,
        from: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<WonLeadEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, WonLeadEntry>(
            r#"
            SELECT l.id, l.name, l.locality, l.sale_amount, l.sale_date,
                   l.commission_amount, l.commission_paid, ld.name AS landing_name
            FROM leads l
            LEFT JOIN landings ld ON ld.id = l.landing_id
            WHERE l.state = 'ganado'
              AND l.sale_amount IS NOT NULL
              AND ($1::timestamptz IS NULL OR l.sale_date >= $1)
              AND ($2::timestamptz IS NULL OR l.sale_date < $2)
            ORDER BY l.sale_date DESC, l.id DESC
            "#,
        )
        .bind(from)
        .bind(before)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    /// Vendas dos últimos 12 meses, um registro por mês com venda.
    pub async fn monthly_sales<'e, E>(&self, executor: E) -> Result<Vec<MonthlySales>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let months = sqlx::query_as::<_, MonthlySales>(
            r#"
            SELECT to_char(date_trunc('month', l.sale_date), 'YYYY-MM') AS month,
                   COUNT(*) AS sales_count,
                   COALESCE(SUM(l.sale_amount), 0) AS total_sales,
                   COALESCE(SUM(l.commission_amount), 0) AS total_commissions
            FROM leads l
            WHERE l.state = 'ganado'
              AND l.sale_date >= date_trunc('month', NOW()) - INTERVAL '11 months'
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(months)
    }

    // =========================================================================
    //  DASHBOARD
    // =========================================================================

    /// KPIs e agrupamentos do período lidos na mesma transação (snapshot consistente).
    pub async fn dashboard<'e, E>(
        &self,
        executor: E,
        since: DateTime<Utc>,
    ) -> Result<(DashboardKpis, Vec<CountEntry>, Vec<CountEntry>, Vec<CountEntry>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let kpis = sqlx::query_as::<_, DashboardKpis>(
            r#"
            SELECT
                COUNT(*) AS total_leads,
                COUNT(*) FILTER (WHERE created_at >= $1) AS leads_in_period,
                COUNT(*) FILTER (WHERE state = 'ganado') AS won_count,
                COALESCE(SUM(sale_amount) FILTER (WHERE state = 'ganado'), 0) AS revenue,
                COALESCE(SUM(commission_amount) FILTER (WHERE state = 'ganado'), 0) AS commissions,
                COALESCE(SUM(quoted_amount) FILTER (WHERE state NOT IN ('ganado', 'perdido')), 0)
                    AS pipeline_value,
                CASE WHEN COUNT(*) = 0 THEN 0::numeric
                     ELSE ROUND(COUNT(*) FILTER (WHERE state = 'ganado')::numeric * 100 / COUNT(*), 2)
                END AS conversion_rate
            FROM leads
            "#,
        )
        .bind(since)
        .fetch_one(&mut *tx)
        .await?;

        let by_state = sqlx::query_as::<_, CountEntry>(
            r#"
            SELECT state::text AS label, COUNT(*) AS count
            FROM leads WHERE created_at >= $1
            GROUP BY state ORDER BY state
            "#,
        )
        .bind(since)
        .fetch_all(&mut *tx)
        .await?;

        let by_source = sqlx::query_as::<_, CountEntry>(
            r#"
            SELECT source::text AS label, COUNT(*) AS count
            FROM leads WHERE created_at >= $1
            GROUP BY source ORDER BY count DESC, source
            "#,
        )
        .bind(since)
        .fetch_all(&mut *tx)
        .await?;

        let by_landing = sqlx::query_as::<_, CountEntry>(
            r#"
            SELECT COALESCE(ld.name, 'Sin landing') AS label, COUNT(*) AS count
            FROM leads l
            LEFT JOIN landings ld ON ld.id = l.landing_id
            WHERE l.created_at >= $1
            GROUP BY 1 ORDER BY count DESC, label
            "#,
        )
        .bind(since)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((kpis, by_state, by_source, by_landing))
    }
}
