//! Repository traits (ports) - define the interface for credential storage
//!
//! Every operation that touches more than one row is a single trait method so
//! that implementations can run it in one transaction (or under one lock).
//! Operations that judge expiry take the caller's `now`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    ChatBinding, NewOneTimeCode, NewPendingRegistration, NewUser, OneTimeCode,
    PendingRegistration, User,
};
use crate::error::DomainError;
use crate::value_objects::{ChatId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by email (exact, case-sensitive match)
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Find the user bound to a Telegram chat
    async fn find_by_chat_id(&self, chat_id: ChatId) -> RepoResult<Option<User>>;

    /// Check if email is already taken by a user
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Create a new user.
    ///
    /// Fails with `EmailAlreadyExists` when the unique email constraint trips.
    async fn create(&self, user: &NewUser) -> RepoResult<User>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>>;

    /// Round-trip to the backing store
    async fn ping(&self) -> RepoResult<()>;
}

// ============================================================================
// Email Token Repository
// ============================================================================

#[async_trait]
pub trait EmailTokenRepository: Send + Sync {
    /// Mark the owner of an outstanding verification token as verified and
    /// clear the token. Returns `None` when no unverified user holds it.
    async fn consume_verification_token(&self, token: &str) -> RepoResult<Option<UserId>>;

    /// Store a reset token, overwriting any previous one
    async fn store_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()>;

    /// Replace the password of the holder of an unexpired reset token and
    /// clear the token. Returns `None` when the token is unknown or expired.
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserId>>;
}

// ============================================================================
// One-Time Code Repository
// ============================================================================

#[async_trait]
pub trait OneTimeCodeRepository: Send + Sync {
    /// Persist a freshly issued code
    async fn create_code(&self, code: &NewOneTimeCode) -> RepoResult<OneTimeCode>;

    /// Mark a live recovery code owned by `email` as used and set the new
    /// password in one step. Returns `None` when no such code is consumable.
    async fn consume_recovery_code(
        &self,
        email: &str,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserId>>;

    /// Claim a live account-link code for `chat_id`.
    ///
    /// Returns `None` when no consumable code matches. Fails with
    /// `TelegramAlreadyLinked` when the code's owner is already bound to a
    /// different chat, and with `ChatBoundToOtherUser` when the chat belongs
    /// to a different user. In both cases the code stays unused.
    async fn bind_chat_with_code(
        &self,
        code: &str,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<ChatBinding>>;

    /// Delete codes whose expiry has passed
    async fn delete_expired_codes(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Pending Registration Repository
// ============================================================================

#[async_trait]
pub trait PendingRegistrationRepository: Send + Sync {
    /// Insert a pending registration, first removing an expired row that
    /// holds the same email. Fails with `EmailAlreadyExists` when a live row
    /// holds it.
    async fn create_pending(
        &self,
        pending: &NewPendingRegistration,
        now: DateTime<Utc>,
    ) -> RepoResult<PendingRegistration>;

    /// Whether a live pending row holds `email`
    async fn live_pending_exists(&self, email: &str, now: DateTime<Utc>) -> RepoResult<bool>;

    /// Whether a live pending row holds `link_code`
    async fn link_code_in_use(&self, link_code: &str, now: DateTime<Utc>) -> RepoResult<bool>;

    /// Turn a live pending registration into a user bound to `chat_id`,
    /// deleting the pending row in the same step.
    ///
    /// Returns `None` when no live row holds `link_code`. Fails with
    /// `ChatBoundToOtherUser` or `EmailAlreadyExists` without consuming the row.
    async fn promote_pending(
        &self,
        link_code: &str,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<User>>;

    /// Delete pending rows whose expiry has passed
    async fn delete_expired_pending(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}
