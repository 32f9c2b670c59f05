// src/services/expense_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Pagination},
    },
    db::ExpenseRepository,
    models::expense::{Expense, ExpenseChanges, ExpenseFilter, ExpenseSummary, NewExpense},
    services::commission,
};

fn check_amount(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(
            "importe",
            "range",
            "El importe debe ser mayor que 0",
        ));
    }
    commission::check_amount("importe", amount).map(|_| ())
}

#[derive(Clone)]
pub struct ExpenseService {
    repo: ExpenseRepository,
}

impl ExpenseService {
    pub fn new(repo: ExpenseRepository) -> Self {
        Self { repo }
    }

    pub async fn create<'e, E>(&self, executor: E, expense: NewExpense) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_amount(expense.amount)?;
        let created = self.repo.insert(executor, &expense).await?;
        tracing::info!(expense_id = created.id, amount = %created.amount, "Gasto registrado");
        Ok(created)
    }

    pub async fn get<'e, E>(&self, executor: E, id: i64) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_by_id(executor, id).await
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, changes: ExpenseChanges) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if let Some(amount) = changes.amount {
            check_amount(amount)?;
        }

        let mut tx = executor.begin().await?;

        let mut expense = self.repo.find_by_id(&mut *tx, id).await?;
        if let Some(kind) = changes.kind {
            expense.kind = kind;
        }
        if let Some(concept) = changes.concept {
            expense.concept = concept;
        }
        if let Some(amount) = changes.amount {
            expense.amount = amount;
        }
        if let Some(spent_at) = changes.spent_at {
            expense.spent_at = spent_at;
        }
        if let Some(notes) = changes.notes {
            expense.notes = notes;
        }
        if let Some(landing_id) = changes.landing_id {
            expense.landing_id = landing_id;
        }
        let expense = self.repo.save(&mut *tx, &expense).await?;

        tx.commit().await?;

        tracing::info!(expense_id = id, "Gasto atualizado");
        Ok(expense)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete(executor, id).await?;
        tracing::info!(expense_id = id, "Gasto removido");
        Ok(())
    }

    /// Página + resumo. O resumo cobre o filtro inteiro, não só a página.
    pub async fn list(
        &self,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Expense>, Pagination, ExpenseSummary), AppError> {
        let (expenses, total) = self.repo.list(filter, page).await?;
        let totals = self.repo.totals_by_kind(filter).await?;
        Ok((
            expenses,
            Pagination::new(page, total),
            ExpenseSummary::from_totals(&totals),
        ))
    }

    pub async fn summary(&self, filter: &ExpenseFilter) -> Result<ExpenseSummary, AppError> {
        let totals = self.repo.totals_by_kind(filter).await?;
        Ok(ExpenseSummary::from_totals(&totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_must_be_positive() {
        assert!(check_amount(dec!(0.01)).is_ok());
        assert!(check_amount(Decimal::ZERO).is_err());
        assert!(check_amount(dec!(-3)).is_err());
        assert!(check_amount(dec!(10000000000)).is_err());
        assert!(check_amount(dec!(19.999)).is_err());
    }
}
