//! PostgreSQL implementation of PendingRegistrationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use sudu_core::entities::{NewPendingRegistration, PendingRegistration, User};
use sudu_core::error::DomainError;
use sudu_core::traits::{PendingRegistrationRepository, RepoResult};
use sudu_core::value_objects::ChatId;

use crate::models::{PendingRegistrationModel, UserModel};

use super::error::{map_db_error, map_unique_violation, map_user_write_error};

#[derive(Clone)]
pub struct PgPendingRegistrationRepository {
    pool: PgPool,
}

impl PgPendingRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingRegistrationRepository for PgPendingRegistrationRepository {
    #[instrument(skip(self, pending), fields(email = %pending.email))]
    async fn create_pending(
        &self,
        pending: &NewPendingRegistration,
        now: DateTime<Utc>,
    ) -> RepoResult<PendingRegistration> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            DELETE FROM pending_registrations WHERE email = $1 AND expires_at <= $2
            ",
        )
        .bind(&pending.email)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let model = sqlx::query_as::<_, PendingRegistrationModel>(
            r"
            INSERT INTO pending_registrations (name, email, password, link_code, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password, link_code, expires_at, created_at
            ",
        )
        .bind(&pending.name)
        .bind(&pending.email)
        .bind(&pending.password_hash)
        .bind(&pending.link_code)
        .bind(pending.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::EmailAlreadyExists))?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(PendingRegistration::from(model))
    }

    #[instrument(skip(self))]
    async fn live_pending_exists(&self, email: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM pending_registrations WHERE email = $1 AND expires_at > $2
            )
            ",
        )
        .bind(email)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, link_code))]
    async fn link_code_in_use(&self, link_code: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM pending_registrations WHERE link_code = $1 AND expires_at > $2
            )
            ",
        )
        .bind(link_code)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, link_code))]
    async fn promote_pending(
        &self,
        link_code: &str,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<User>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let pending = sqlx::query_as::<_, PendingRegistrationModel>(
            r"
            SELECT id, name, email, password, link_code, expires_at, created_at
            FROM pending_registrations
            WHERE link_code = $1 AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(link_code)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some(pending) = pending else {
            return Ok(None);
        };

        let chat_bound = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM users WHERE telegram_chat_id = $1)
            ",
        )
        .bind(chat_id.into_inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if chat_bound {
            return Err(DomainError::ChatBoundToOtherUser);
        }

        // Expiry is judged again at delete time
        let deleted = sqlx::query(
            r"
            DELETE FROM pending_registrations WHERE id = $1 AND expires_at > $2
            ",
        )
        .bind(pending.id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if deleted.rows_affected() == 0 {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, UserModel>(
            r"
            INSERT INTO users (name, email, password, email_verified, telegram_chat_id)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING id, name, email, email_verified, telegram_chat_id, created_at
            ",
        )
        .bind(&pending.name)
        .bind(&pending.email)
        .bind(&pending.password)
        .bind(chat_id.into_inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_user_write_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(Some(User::from(user)))
    }

    #[instrument(skip(self))]
    async fn delete_expired_pending(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM pending_registrations WHERE expires_at <= $1
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
