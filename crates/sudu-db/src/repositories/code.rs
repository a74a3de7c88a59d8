//! PostgreSQL implementation of OneTimeCodeRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use sudu_core::entities::{ChatBinding, CodePurpose, NewOneTimeCode, OneTimeCode, User};
use sudu_core::error::DomainError;
use sudu_core::traits::{OneTimeCodeRepository, RepoResult};
use sudu_core::value_objects::{ChatId, UserId};

use crate::mappers::code_table;
use crate::models::{OneTimeCodeModel, UserModel};

use super::error::{map_db_error, map_user_write_error};

#[derive(Clone)]
pub struct PgOneTimeCodeRepository {
    pool: PgPool,
}

impl PgOneTimeCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OneTimeCodeRepository for PgOneTimeCodeRepository {
    #[instrument(skip(self, code), fields(purpose = %code.purpose, user_id = %code.user_id))]
    async fn create_code(&self, code: &NewOneTimeCode) -> RepoResult<OneTimeCode> {
        let sql = format!(
            r"
            INSERT INTO {} (user_id, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, code, expires_at, used, created_at
            ",
            code_table(code.purpose)
        );

        let model = sqlx::query_as::<_, OneTimeCodeModel>(&sql)
            .bind(code.user_id.into_inner())
            .bind(&code.code)
            .bind(code.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(model.into_entity(code.purpose))
    }

    #[instrument(skip(self, code, password_hash))]
    async fn consume_recovery_code(
        &self,
        email: &str,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserId>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // The row lock makes a concurrent consumer re-check `used` after we commit
        let user_id = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE telegram_codes
            SET used = TRUE
            WHERE used = FALSE AND id = (
                SELECT c.id
                FROM telegram_codes c
                JOIN users u ON u.id = c.user_id
                WHERE u.email = $1 AND c.code = $2 AND c.used = FALSE AND c.expires_at > $3
                ORDER BY c.created_at DESC
                LIMIT 1
                FOR UPDATE OF c
            )
            RETURNING user_id
            ",
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        sqlx::query(
            r"
            UPDATE users SET password = $2 WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(Some(UserId::new(user_id)))
    }

    #[instrument(skip(self, code))]
    async fn bind_chat_with_code(
        &self,
        code: &str,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<ChatBinding>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let claimed = sqlx::query_as::<_, (i64, i64)>(
            r"
            SELECT id, user_id
            FROM telegram_link_codes
            WHERE code = $1 AND used = FALSE AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(code)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some((code_id, owner_id)) = claimed else {
            return Ok(None);
        };

        let owner = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, name, email, email_verified, telegram_chat_id, created_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if owner.telegram_chat_id == Some(chat_id.into_inner()) {
            mark_link_code_used(&mut tx, code_id).await?;
            tx.commit().await.map_err(map_db_error)?;
            debug!(user_id = owner_id, "Chat already bound to code owner");
            return Ok(Some(ChatBinding::AlreadyLinked(User::from(owner))));
        }

        if owner.telegram_chat_id.is_some() {
            // A linked account keeps its chat; the code stays unused
            return Err(DomainError::TelegramAlreadyLinked);
        }

        let bound_elsewhere = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM users WHERE telegram_chat_id = $1 AND id <> $2)
            ",
        )
        .bind(chat_id.into_inner())
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if bound_elsewhere {
            // Dropping the transaction rolls back; the code stays claimable
            return Err(DomainError::ChatBoundToOtherUser);
        }

        let linked = sqlx::query_as::<_, UserModel>(
            r"
            UPDATE users
            SET telegram_chat_id = $2
            WHERE id = $1
            RETURNING id, name, email, email_verified, telegram_chat_id, created_at
            ",
        )
        .bind(owner_id)
        .bind(chat_id.into_inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_user_write_error)?;

        mark_link_code_used(&mut tx, code_id).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(Some(ChatBinding::Linked(User::from(linked))))
    }

    #[instrument(skip(self))]
    async fn delete_expired_codes(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut deleted = 0;
        for purpose in [CodePurpose::AccountLink, CodePurpose::PasswordRecovery] {
            let sql = format!("DELETE FROM {} WHERE expires_at <= $1", code_table(purpose));
            let result = sqlx::query(&sql)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
            deleted += result.rows_affected();
        }
        Ok(deleted)
    }
}

async fn mark_link_code_used(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    code_id: i64,
) -> RepoResult<()> {
    sqlx::query(
        r"
        UPDATE telegram_link_codes SET used = TRUE WHERE id = $1
        ",
    )
    .bind(code_id)
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;
    Ok(())
}
