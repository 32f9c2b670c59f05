// src/db/activity_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{
        db_utils::foreign_key_violation,
        error::{AppError, Resource},
    },
    models::activity::{Activity, NewActivity},
};

const ACTIVITY_COLUMNS: &str =
    "id, lead_id, kind, description, previous_state, new_state, metadata, created_at";

/// Histórico dos leads. Só há inserção e leitura.
#[derive(Clone, Default)]
pub struct ActivityRepository;

impl ActivityRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn append<'e, E>(&self, executor: E, activity: &NewActivity) -> Result<Activity, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO activities (lead_id, kind, description, previous_state, new_state, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Activity>(&sql)
            .bind(activity.lead_id)
            .bind(activity.kind)
            .bind(&activity.description)
            .bind(activity.previous_state)
            .bind(activity.new_state)
            .bind(&activity.metadata)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if foreign_key_violation(&e) {
                    return AppError::NotFound(Resource::Lead);
                }
                e.into()
            })
    }

    /// Mais recentes primeiro; empate resolvido pelo id.
    pub async fn list_for_lead<'e, E>(
        &self,
        executor: E,
        lead_id: i64,
        limit: u32,
    ) -> Result<Vec<Activity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}
            FROM activities
            WHERE lead_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        );

        let activities = sqlx::query_as::<_, Activity>(&sql)
            .bind(lead_id)
            .bind(i64::from(limit))
            .fetch_all(executor)
            .await?;

        Ok(activities)
    }
}
