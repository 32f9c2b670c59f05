// src/services/landing_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LandingRepository,
    models::landing::{Landing, LandingChanges, LandingWithCount, NewLanding},
};

pub const API_KEY_PREFIX: &str = "lf_";

/// Novas tentativas quando a chave gerada já existe.
const MAX_KEY_RETRIES: usize = 3;

/// `lf_` + 64 caracteres hexadecimais (dois UUID v4).
pub fn generate_api_key() -> String {
    format!(
        "{API_KEY_PREFIX}{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Slug: só minúsculas, dígitos e hífen.
pub fn check_slug(slug: &str) -> Result<(), AppError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(AppError::validation(
            "slug",
            "slug",
            "El slug solo puede contener minúsculas, números y guiones",
        ));
    }
    Ok(())
}

fn is_key_collision(err: &AppError) -> bool {
    matches!(err, AppError::Conflict("api_key_collision"))
}

#[derive(Clone)]
pub struct LandingService {
    repo: LandingRepository,
}

impl LandingService {
    pub fn new(repo: LandingRepository) -> Self {
        Self { repo }
    }

    pub async fn create<'e, E>(&self, executor: E, landing: NewLanding) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        check_slug(&landing.slug)?;

        // Fora de transação: cada tentativa que falha não pode abortar as seguintes
        let mut conn = executor.acquire().await?;
        let mut attempt = 0;
        let created = loop {
            match self.repo.insert(&mut *conn, &landing, &generate_api_key()).await {
                Err(e) if is_key_collision(&e) && attempt < MAX_KEY_RETRIES => {
                    attempt += 1;
                    tracing::warn!(attempt, "Colisão de API Key ao criar landing, gerando outra");
                }
                other => break other?,
            }
        };

        tracing::info!(landing_id = created.id, slug = %created.slug, "Landing criada");
        Ok(created)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<LandingWithCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_with_counts(executor).await
    }

    pub async fn get<'e, E>(&self, executor: E, id: i64) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_by_id(executor, id).await
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, changes: LandingChanges) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut landing = self.repo.find_by_id(&mut *tx, id).await?;
        if let Some(name) = changes.name {
            landing.name = name;
        }
        if let Some(url) = changes.url {
            landing.url = url;
        }
        if let Some(description) = changes.description {
            landing.description = description;
        }
        if let Some(active) = changes.active {
            landing.active = active;
        }
        if let Some(notify_email) = changes.notify_email {
            landing.notify_email = notify_email;
        }
        if let Some(notify_push) = changes.notify_push {
            landing.notify_push = notify_push;
        }
        let landing = self.repo.save(&mut *tx, &landing).await?;

        tx.commit().await?;

        tracing::info!(landing_id = id, active = landing.active, "Landing atualizada");
        Ok(landing)
    }

    /// Gera uma chave nova. A anterior deixa de funcionar imediatamente.
    pub async fn regenerate_key<'e, E>(&self, executor: E, id: i64) -> Result<Landing, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let mut attempt = 0;
        let landing = loop {
            match self.repo.replace_api_key(&mut *conn, id, &generate_api_key()).await {
                Err(e) if is_key_collision(&e) && attempt < MAX_KEY_RETRIES => {
                    attempt += 1;
                    tracing::warn!(attempt, landing_id = id, "Colisão de API Key, gerando outra");
                }
                other => break other?,
            }
        };

        tracing::info!(landing_id = id, "API Key regenerada");
        Ok(landing)
    }

    /// Os leads e gastos da landing continuam existindo, sem landing.
    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete(executor, id).await?;
        tracing::info!(landing_id = id, "Landing removida");
        Ok(())
    }
}
