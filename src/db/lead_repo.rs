// src/db/lead_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::like_pattern,
        error::{AppError, Resource},
        pagination::PageRequest,
    },
    models::{
        activity::ActivityKind,
        lead::{Lead, LeadFilter, LeadListItem, LeadPriority, LeadSort, LeadState, NewLead},
    },
};

// Colunas na ordem dos campos de `Lead`. Usadas com o alias `l`.
const LEAD_COLUMNS: &str = r#"
    l.id, l.name, l.phone, l.email, l.locality, l.address,
    l.state, l.source, l.priority, l.services,
    l.quoted_amount, l.quote_date, l.sale_amount, l.sale_date,
    l.commission_amount, l.commission_paid,
    l.landing_id, l.utm_source, l.utm_medium, l.utm_campaign, l.utm_term, l.utm_content,
    l.origin_ip, l.user_agent, l.notes, l.created_at, l.updated_at
"#;

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    /// Insere o lead. O estado inicial é sempre `nuevo`.
    pub async fn insert<'e, E>(&self, executor: E, new_lead: &NewLead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = new_lead.contact();
        let origin = new_lead.origin();
        let utm = origin.map(|o| &o.utm);

        let sql = format!(
            r#"
            WITH l AS (
                INSERT INTO leads (
                    name, phone, email, locality, address, state, source, priority, services, notes,
                    landing_id, utm_source, utm_medium, utm_campaign, utm_term, utm_content,
                    origin_ip, user_agent
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                RETURNING *
            )
            SELECT {LEAD_COLUMNS} FROM l
            "#
        );

        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(&contact.name)
            .bind(&contact.phone)
            .bind(&contact.email)
            .bind(&contact.locality)
            .bind(&contact.address)
            .bind(LeadState::New)
            .bind(new_lead.source())
            .bind(new_lead.priority())
            .bind(&contact.services)
            .bind(&contact.notes)
            .bind(origin.map(|o| o.landing_id))
            .bind(utm.and_then(|u| u.source.as_deref()))
            .bind(utm.and_then(|u| u.medium.as_deref()))
            .bind(utm.and_then(|u| u.campaign.as_deref()))
            .bind(utm.and_then(|u| u.term.as_deref()))
            .bind(utm.and_then(|u| u.content.as_deref()))
            .bind(origin.and_then(|o| o.origin_ip.as_deref()))
            .bind(origin.and_then(|o| o.user_agent.as_deref()))
            .fetch_one(executor)
            .await?;

        Ok(lead)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads l WHERE l.id = $1");
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(Resource::Lead))
    }

    /// Igual a `find_by_id`, mas trava a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: i64) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads l WHERE l.id = $1 FOR UPDATE");
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(Resource::Lead))
    }

    /// Grava todos os campos mutáveis do lead e renova `updated_at`.
    pub async fn save<'e, E>(&self, executor: E, lead: &Lead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH l AS (
                UPDATE leads SET
                    name = $2, phone = $3, email = $4, locality = $5, address = $6,
                    state = $7, source = $8, priority = $9, services = $10,
                    quoted_amount = $11, quote_date = $12,
                    sale_amount = $13, sale_date = $14,
                    commission_amount = $15, commission_paid = $16,
                    notes = $17,
                    updated_at = GREATEST(NOW(), created_at)
                WHERE id = $1
                RETURNING *
            )
            SELECT {LEAD_COLUMNS} FROM l
            "#
        );

        sqlx::query_as::<_, Lead>(&sql)
            .bind(lead.id)
            .bind(&lead.name)
            .bind(&lead.phone)
            .bind(&lead.email)
            .bind(&lead.locality)
            .bind(&lead.address)
            .bind(lead.state)
            .bind(lead.source)
            .bind(lead.priority)
            .bind(&lead.services)
            .bind(lead.quoted_amount)
            .bind(lead.quote_date)
            .bind(lead.sale_amount)
            .bind(lead.sale_date)
            .bind(lead.commission_amount)
            .bind(lead.commission_paid)
            .bind(&lead.notes)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(Resource::Lead))
    }

    /// As atividades vão junto (ON DELETE CASCADE).
    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(Resource::Lead));
        }
        Ok(())
    }

    // =========================================================================
    //  LISTAGEM
    // =========================================================================

    /// Página de leads + total do filtro.
    pub async fn list(
        &self,
        filter: &LeadFilter,
        sort: LeadSort,
        page: PageRequest,
    ) -> Result<(Vec<LeadListItem>, i64), AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads l WHERE TRUE");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {LEAD_COLUMNS},
                   ld.name AS landing_name,
                   ld.slug AS landing_slug,
                   (SELECT COUNT(*) FROM activities a WHERE a.lead_id = l.id) AS activity_count
            FROM leads l
            LEFT JOIN landings ld ON ld.id = l.landing_id
            WHERE TRUE
            "#
        ));
        push_filter(&mut query, filter);

        // Coluna e direção vêm de enums fechados, nunca do texto do cliente
        let direction = sort.direction.sql();
        query.push(format!(
            " ORDER BY {} {direction} NULLS LAST, l.id {direction}",
            sort.field.column()
        ));
        query.push(" LIMIT ").push_bind(i64::from(page.limit));
        query.push(" OFFSET ").push_bind(page.offset());

        let leads = query
            .build_query_as::<LeadListItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok((leads, total))
    }

    // =========================================================================
    //  AÇÕES EM MASSA
    // =========================================================================

    pub async fn delete_many<'e, E>(&self, executor: E, ids: &[i64]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leads WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Muda o estado dos leads existentes e registra uma atividade por lead
    /// afetado, numa única instrução.
    ///
    /// Com `commission_percent`, lead com venda e sem comissão ganha a comissão
    /// `ROUND(venda * taxa / 100, 2)`. As demais colunas financeiras ficam como estão.
    pub async fn update_state_many<'e, E>(
        &self,
        executor: E,
        ids: &[i64],
        state: LeadState,
        description: &str,
        commission_percent: Option<Decimal>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            WITH previous AS (
                SELECT id, state FROM leads WHERE id = ANY($1) FOR UPDATE
            ),
            updated AS (
                UPDATE leads l
                SET state = $2,
                    commission_amount = CASE
                        WHEN $5::numeric IS NOT NULL
                             AND l.sale_amount IS NOT NULL
                             AND l.commission_amount IS NULL
                        THEN ROUND(l.sale_amount * $5::numeric / 100, 2)
                        ELSE l.commission_amount
                    END,
                    updated_at = GREATEST(NOW(), l.created_at)
                FROM previous p
                WHERE l.id = p.id
                RETURNING l.id, p.state AS previous_state
            )
            INSERT INTO activities (lead_id, kind, description, previous_state, new_state, metadata)
            SELECT u.id, $3, $4, u.previous_state, $2, jsonb_build_object('bulk', true)
            FROM updated u
            "#,
        )
        .bind(ids)
        .bind(state)
        .bind(ActivityKind::StateChange)
        .bind(description)
        .bind(commission_percent)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_priority_many<'e, E>(
        &self,
        executor: E,
        ids: &[i64],
        priority: LeadPriority,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE leads SET priority = $2, updated_at = GREATEST(NOW(), created_at) WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(priority)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    // Enums comparados como texto: evita depender do tipo array do Postgres
    if !filter.states.is_empty() {
        let states: Vec<String> = filter.states.iter().map(|s| s.as_str().to_string()).collect();
        query.push(" AND l.state::text = ANY(").push_bind(states).push(")");
    }
    if !filter.sources.is_empty() {
        let sources: Vec<String> = filter.sources.iter().map(|s| s.as_str().to_string()).collect();
        query.push(" AND l.source::text = ANY(").push_bind(sources).push(")");
    }
    if let Some(priority) = filter.priority {
        query.push(" AND l.priority = ").push_bind(priority);
    }
    if let Some(landing_id) = filter.landing_id {
        query.push(" AND l.landing_id = ").push_bind(landing_id);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query
            .push(" AND (l.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.phone ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.locality ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filter.created_from {
        query.push(" AND l.created_at >= ").push_bind(from);
    }
    if let Some(before) = filter.created_before {
        query.push(" AND l.created_at < ").push_bind(before);
    }
}
