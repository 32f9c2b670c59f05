// src/db/expense_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::foreign_key_violation,
        error::{AppError, Resource},
        pagination::PageRequest,
    },
    models::expense::{Expense, ExpenseFilter, ExpenseKindTotal, NewExpense},
};

const EXPENSE_COLUMNS: &str = r#"
    e.id, e.kind, e.concept, e.amount, e.spent_at, e.notes, e.landing_id,
    ld.name AS landing_name, e.created_at, e.updated_at
"#;

// landing_id apontando para landing inexistente
fn map_landing_fk(e: sqlx::Error) -> AppError {
    if foreign_key_violation(&e) {
        return AppError::NotFound(Resource::Landing);
    }
    e.into()
}

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, expense: &NewExpense) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH e AS (
                INSERT INTO expenses (kind, concept, amount, spent_at, notes, landing_id)
                VALUES ($1, $2, $3, COALESCE($4, NOW()), $5, $6)
                RETURNING *
            )
            SELECT {EXPENSE_COLUMNS}
            FROM e LEFT JOIN landings ld ON ld.id = e.landing_id
            "#
        );

        sqlx::query_as::<_, Expense>(&sql)
            .bind(expense.kind)
            .bind(&expense.concept)
            .bind(expense.amount)
            .bind(expense.spent_at)
            .bind(&expense.notes)
            .bind(expense.landing_id)
            .fetch_one(executor)
            .await
            .map_err(map_landing_fk)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses e LEFT JOIN landings ld ON ld.id = e.landing_id WHERE e.id = $1"
        );
        sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(Resource::Expense))
    }

    pub async fn save<'e, E>(&self, executor: E, expense: &Expense) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH e AS (
                UPDATE expenses SET
                    kind = $2, concept = $3, amount = $4, spent_at = $5,
                    notes = $6, landing_id = $7, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {EXPENSE_COLUMNS}
            FROM e LEFT JOIN landings ld ON ld.id = e.landing_id
            "#
        );

        sqlx::query_as::<_, Expense>(&sql)
            .bind(expense.id)
            .bind(expense.kind)
            .bind(&expense.concept)
            .bind(expense.amount)
            .bind(expense.spent_at)
            .bind(&expense.notes)
            .bind(expense.landing_id)
            .fetch_optional(executor)
            .await
            .map_err(map_landing_fk)?
            .ok_or(AppError::NotFound(Resource::Expense))
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(Resource::Expense));
        }
        Ok(())
    }

    /// Página de gastos (mais recentes primeiro) + total de linhas do filtro.
    pub async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Expense>, i64), AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM expenses e WHERE TRUE");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses e LEFT JOIN landings ld ON ld.id = e.landing_id WHERE TRUE"
        ));
        push_filter(&mut query, filter);
        query.push(" ORDER BY e.spent_at DESC, e.id DESC");
        query.push(" LIMIT ").push_bind(i64::from(page.limit));
        query.push(" OFFSET ").push_bind(page.offset());

        let expenses = query.build_query_as::<Expense>().fetch_all(&self.pool).await?;
        Ok((expenses, total))
    }

    /// Totais por tipo sobre o filtro inteiro, sem paginação.
    pub async fn totals_by_kind(&self, filter: &ExpenseFilter) -> Result<Vec<ExpenseKindTotal>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT e.kind, COALESCE(SUM(e.amount), 0) AS total FROM expenses e WHERE TRUE",
        );
        push_filter(&mut query, filter);
        query.push(" GROUP BY e.kind ORDER BY e.kind");

        let totals = query
            .build_query_as::<ExpenseKindTotal>()
            .fetch_all(&self.pool)
            .await?;
        Ok(totals)
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ExpenseFilter) {
    if let Some(kind) = filter.kind {
        query.push(" AND e.kind = ").push_bind(kind);
    }
    if let Some(landing_id) = filter.landing_id {
        query.push(" AND e.landing_id = ").push_bind(landing_id);
    }
    if let Some(from) = filter.spent_from {
        query.push(" AND e.spent_at >= ").push_bind(from);
    }
    if let Some(before) = filter.spent_before {
        query.push(" AND e.spent_at < ").push_bind(before);
    }
}
