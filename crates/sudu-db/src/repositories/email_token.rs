//! PostgreSQL implementation of EmailTokenRepository
//!
//! Tokens live on the `users` row. Each consume is one conditional UPDATE,
//! so two concurrent requests with the same token cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use sudu_core::error::DomainError;
use sudu_core::traits::{EmailTokenRepository, RepoResult};
use sudu_core::value_objects::UserId;

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgEmailTokenRepository {
    pool: PgPool,
}

impl PgEmailTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTokenRepository for PgEmailTokenRepository {
    #[instrument(skip_all)]
    async fn consume_verification_token(&self, token: &str) -> RepoResult<Option<UserId>> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE users
            SET email_verified = TRUE, verification_token = NULL
            WHERE verification_token = $1 AND email_verified = FALSE
            RETURNING id
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(id.map(UserId::new))
    }

    #[instrument(skip(self, token))]
    async fn store_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET reset_token = $2, reset_token_expires = $3
            WHERE id = $1
            ",
        )
        .bind(user_id.into_inner())
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self, token, password_hash))]
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserId>> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE users
            SET password = $2, reset_token = NULL, reset_token_expires = NULL
            WHERE reset_token = $1 AND reset_token_expires > $3
            RETURNING id
            ",
        )
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(id.map(UserId::new))
    }
}
