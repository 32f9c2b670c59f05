// src/db/landing_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{
        db_utils::unique_violation,
        error::{AppError, Resource},
    },
    models::landing::{Landing, LandingWithCount, NewLanding},
};

const LANDING_COLUMNS: &str = r#"
    id, name, slug, url, description, api_key, active,
    notify_email, notify_push, created_at, updated_at
"#;

/// Converte violações de UNIQUE nos conflitos conhecidos.
fn map_unique(e: sqlx::Error) -> AppError {
    match unique_violation(&e).as_deref() {
        Some("landings_slug_key") => AppError::Conflict("landing_slug_taken"),
        Some("landings_api_key_key") => AppError::Conflict("api_key_collision"),
        _ => e.into(),
    }
}

#[derive(Clone, Default)]
pub struct LandingRepository;

impl LandingRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        landing: &NewLanding,
        api_key: &str,
    ) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO landings (name, slug, url, description, api_key, notify_email, notify_push)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LANDING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Landing>(&sql)
            .bind(&landing.name)
            .bind(&landing.slug)
            .bind(&landing.url)
            .bind(&landing.description)
            .bind(api_key)
            .bind(landing.notify_email)
            .bind(landing.notify_push)
            .fetch_one(executor)
            .await
            .map_err(map_unique)
    }

    pub async fn list_with_counts<'e, E>(&self, executor: E) -> Result<Vec<LandingWithCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {LANDING_COLUMNS},
                   (SELECT COUNT(*) FROM leads l WHERE l.landing_id = landings.id) AS lead_count
            FROM landings
            ORDER BY name ASC, id ASC
            "#
        );

        let landings = sqlx::query_as::<_, LandingWithCount>(&sql)
            .fetch_all(executor)
            .await?;

        Ok(landings)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LANDING_COLUMNS} FROM landings WHERE id = $1");
        sqlx::query_as::<_, Landing>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(Resource::Landing))
    }

    /// Só devolve landings ativas. Chave inexistente e landing inativa dão o mesmo `None`.
    pub async fn find_active_by_api_key<'e, E>(
        &self,
        executor: E,
        api_key: &str,
    ) -> Result<Option<Landing>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LANDING_COLUMNS} FROM landings WHERE api_key = $1 AND active");
        let landing = sqlx::query_as::<_, Landing>(&sql)
            .bind(api_key)
            .fetch_optional(executor)
            .await?;

        Ok(landing)
    }

    pub async fn save<'e, E>(&self, executor: E, landing: &Landing) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE landings SET
                name = $2, url = $3, description = $4, active = $5,
                notify_email = $6, notify_push = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {LANDING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Landing>(&sql)
            .bind(landing.id)
            .bind(&landing.name)
            .bind(&landing.url)
            .bind(&landing.description)
            .bind(landing.active)
            .bind(landing.notify_email)
            .bind(landing.notify_push)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(Resource::Landing))
    }

    /// Troca a chave num único UPDATE: a antiga deixa de valer no commit.
    pub async fn replace_api_key<'e, E>(
        &self,
        executor: E,
        id: i64,
        api_key: &str,
    ) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE landings SET api_key = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {LANDING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Landing>(&sql)
            .bind(id)
            .bind(api_key)
            .fetch_optional(executor)
            .await
            .map_err(map_unique)?
            .ok_or(AppError::NotFound(Resource::Landing))
    }

    /// Leads e gastos da landing ficam com `landing_id = NULL` (ON DELETE SET NULL).
    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM landings WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(Resource::Landing));
        }
        Ok(())
    }
}
