//! In-memory credential store
//!
//! Same contract as the PostgreSQL repositories. Each trait method runs as
//! one critical section under a single mutex, which gives the multi-row
//! operations the atomicity a transaction gives them in Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::instrument;

use sudu_core::entities::{
    ChatBinding, CodePurpose, NewOneTimeCode, NewPendingRegistration, NewUser, OneTimeCode,
    PendingRegistration, User,
};
use sudu_core::error::DomainError;
use sudu_core::traits::{
    EmailTokenRepository, OneTimeCodeRepository, PendingRegistrationRepository, RepoResult,
    UserRepository,
};
use sudu_core::value_objects::{ChatId, UserId};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
    verification_token: Option<String>,
    reset_token: Option<String>,
    reset_token_expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct PendingRecord {
    pending: PendingRegistration,
    password_hash: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    available: bool,
    next_user_id: i64,
    next_code_id: i64,
    next_pending_id: i64,
    users: Vec<UserRecord>,
    codes: Vec<OneTimeCode>,
    pending: Vec<PendingRecord>,
}

impl MemoryState {
    fn check_available(&self) -> RepoResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(DomainError::DatabaseError("store unavailable".to_string()))
        }
    }

    fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|r| r.user.email == email)
    }

    fn user_mut(&mut self, id: UserId) -> Option<&mut UserRecord> {
        self.users.iter_mut().find(|r| r.user.id == id)
    }

    fn chat_owner(&self, chat_id: ChatId) -> Option<UserId> {
        self.users
            .iter()
            .find(|r| r.user.is_bound_to(chat_id))
            .map(|r| r.user.id)
    }

    fn insert_user(&mut self, new_user: &NewUser) -> RepoResult<User> {
        if self.user_by_email(&new_user.email).is_some() {
            return Err(DomainError::EmailAlreadyExists);
        }
        if let Some(chat_id) = new_user.telegram_chat_id {
            if self.chat_owner(chat_id).is_some() {
                return Err(DomainError::ChatBoundToOtherUser);
            }
        }

        self.next_user_id += 1;
        let user = User {
            id: UserId::new(self.next_user_id),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            email_verified: new_user.email_verified,
            telegram_chat_id: new_user.telegram_chat_id,
            created_at: Utc::now(),
        };
        self.users.push(UserRecord {
            user: user.clone(),
            password_hash: new_user.password_hash.clone(),
            verification_token: new_user.verification_token.clone(),
            reset_token: None,
            reset_token_expires: None,
        });
        Ok(user)
    }

    /// Index of the newest consumable code matching `pred`
    fn newest_consumable_code(
        &self,
        now: DateTime<Utc>,
        pred: impl Fn(&OneTimeCode) -> bool,
    ) -> Option<usize> {
        self.codes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, c)| c.is_consumable_at(now) && pred(c))
            .map(|(idx, _)| idx)
    }
}

/// Credential store held in process memory. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                available: true,
                ..MemoryState::default()
            })),
        }
    }

    /// Make every operation fail as if the database were unreachable
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        self.state.lock().users.len()
    }

    /// Number of pending registrations, live or expired
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of stored codes of a purpose, in any state
    pub fn code_count(&self, purpose: CodePurpose) -> usize {
        self.state
            .lock()
            .codes
            .iter()
            .filter(|c| c.purpose == purpose)
            .count()
    }

    /// Codes issued to a user for a purpose, oldest first
    pub fn codes_for(&self, user_id: UserId, purpose: CodePurpose) -> Vec<OneTimeCode> {
        self.state
            .lock()
            .codes
            .iter()
            .filter(|c| c.user_id == user_id && c.purpose == purpose)
            .cloned()
            .collect()
    }

    /// Outstanding verification token of a user
    pub fn verification_token_of(&self, email: &str) -> Option<String> {
        self.state
            .lock()
            .user_by_email(email)
            .and_then(|r| r.verification_token.clone())
    }

    /// Outstanding reset token of a user
    pub fn reset_token_of(&self, email: &str) -> Option<String> {
        self.state
            .lock()
            .user_by_email(email)
            .and_then(|r| r.reset_token.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.user_by_email(email).map(|r| r.user.clone()))
    }

    async fn find_by_chat_id(&self, chat_id: ChatId) -> RepoResult<Option<User>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state
            .users
            .iter()
            .find(|r| r.user.is_bound_to(chat_id))
            .map(|r| r.user.clone()))
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.user_by_email(email).is_some())
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.insert_user(user)
    }

    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state
            .users
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.password_hash.clone()))
    }

    async fn ping(&self) -> RepoResult<()> {
        self.state.lock().check_available()
    }
}

#[async_trait]
impl EmailTokenRepository for MemoryStore {
    async fn consume_verification_token(&self, token: &str) -> RepoResult<Option<UserId>> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(record) = state.users.iter_mut().find(|r| {
            !r.user.email_verified && r.verification_token.as_deref() == Some(token)
        }) else {
            return Ok(None);
        };

        record.user.email_verified = true;
        record.verification_token = None;
        Ok(Some(record.user.id))
    }

    async fn store_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut state = self.state.lock();
        state.check_available()?;

        let record = state.user_mut(user_id).ok_or(DomainError::UserNotFound)?;
        record.reset_token = Some(token.to_string());
        record.reset_token_expires = Some(expires_at);
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserId>> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(record) = state.users.iter_mut().find(|r| {
            r.reset_token.as_deref() == Some(token)
                && r.reset_token_expires.is_some_and(|expires| expires > now)
        }) else {
            return Ok(None);
        };

        record.password_hash = password_hash.to_string();
        record.reset_token = None;
        record.reset_token_expires = None;
        Ok(Some(record.user.id))
    }
}

#[async_trait]
impl OneTimeCodeRepository for MemoryStore {
    async fn create_code(&self, code: &NewOneTimeCode) -> RepoResult<OneTimeCode> {
        let mut state = self.state.lock();
        state.check_available()?;

        if !state.users.iter().any(|r| r.user.id == code.user_id) {
            return Err(DomainError::UserNotFound);
        }

        state.next_code_id += 1;
        let stored = OneTimeCode {
            id: state.next_code_id,
            user_id: code.user_id,
            purpose: code.purpose,
            code: code.code.clone(),
            expires_at: code.expires_at,
            used: false,
            created_at: Utc::now(),
        };
        state.codes.push(stored.clone());
        Ok(stored)
    }

    async fn consume_recovery_code(
        &self,
        email: &str,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserId>> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(owner) = state.user_by_email(email).map(|r| r.user.id) else {
            return Ok(None);
        };
        let Some(idx) = state.newest_consumable_code(now, |c| {
            c.purpose == CodePurpose::PasswordRecovery && c.user_id == owner && c.code == code
        }) else {
            return Ok(None);
        };

        state.codes[idx].used = true;
        if let Some(record) = state.user_mut(owner) {
            record.password_hash = password_hash.to_string();
        }
        Ok(Some(owner))
    }

    async fn bind_chat_with_code(
        &self,
        code: &str,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<ChatBinding>> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(idx) = state.newest_consumable_code(now, |c| {
            c.purpose == CodePurpose::AccountLink && c.code == code
        }) else {
            return Ok(None);
        };
        let owner = state.codes[idx].user_id;

        let owner_chat = state
            .users
            .iter()
            .find(|r| r.user.id == owner)
            .ok_or(DomainError::UserNotFound)?
            .user
            .telegram_chat_id;
        let already_bound = owner_chat == Some(chat_id);
        if !already_bound {
            if owner_chat.is_some() {
                return Err(DomainError::TelegramAlreadyLinked);
            }
            if state.chat_owner(chat_id).is_some() {
                return Err(DomainError::ChatBoundToOtherUser);
            }
        }

        state.codes[idx].used = true;
        let record = state.user_mut(owner).ok_or(DomainError::UserNotFound)?;
        if already_bound {
            return Ok(Some(ChatBinding::AlreadyLinked(record.user.clone())));
        }
        record.user.telegram_chat_id = Some(chat_id);
        Ok(Some(ChatBinding::Linked(record.user.clone())))
    }

    async fn delete_expired_codes(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut state = self.state.lock();
        state.check_available()?;

        let before = state.codes.len();
        state.codes.retain(|c| !c.is_expired_at(now));
        Ok((before - state.codes.len()) as u64)
    }
}

#[async_trait]
impl PendingRegistrationRepository for MemoryStore {
    async fn create_pending(
        &self,
        pending: &NewPendingRegistration,
        now: DateTime<Utc>,
    ) -> RepoResult<PendingRegistration> {
        let mut state = self.state.lock();
        state.check_available()?;

        state
            .pending
            .retain(|p| p.pending.email != pending.email || p.pending.is_live_at(now));
        if state.pending.iter().any(|p| p.pending.email == pending.email) {
            return Err(DomainError::EmailAlreadyExists);
        }

        state.next_pending_id += 1;
        let stored = PendingRegistration {
            id: state.next_pending_id,
            name: pending.name.clone(),
            email: pending.email.clone(),
            link_code: pending.link_code.clone(),
            expires_at: pending.expires_at,
            created_at: Utc::now(),
        };
        state.pending.push(PendingRecord {
            pending: stored.clone(),
            password_hash: pending.password_hash.clone(),
        });
        Ok(stored)
    }

    async fn live_pending_exists(&self, email: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state
            .pending
            .iter()
            .any(|p| p.pending.email == email && p.pending.is_live_at(now)))
    }

    async fn link_code_in_use(&self, link_code: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state
            .pending
            .iter()
            .any(|p| p.pending.link_code == link_code && p.pending.is_live_at(now)))
    }

    async fn promote_pending(
        &self,
        link_code: &str,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<User>> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(idx) = state
            .pending
            .iter()
            .rposition(|p| p.pending.link_code == link_code && p.pending.is_live_at(now))
        else {
            return Ok(None);
        };

        if state.chat_owner(chat_id).is_some() {
            return Err(DomainError::ChatBoundToOtherUser);
        }

        let record = &state.pending[idx];
        let new_user = NewUser {
            name: record.pending.name.clone(),
            email: record.pending.email.clone(),
            password_hash: record.password_hash.clone(),
            email_verified: false,
            verification_token: None,
            telegram_chat_id: Some(chat_id),
        };
        // Insert first: a failed insert must leave the pending row in place
        let user = state.insert_user(&new_user)?;
        state.pending.remove(idx);
        Ok(Some(user))
    }

    async fn delete_expired_pending(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut state = self.state.lock();
        state.check_available()?;

        let before = state.pending.len();
        state.pending.retain(|p| p.pending.is_live_at(now));
        Ok((before - state.pending.len()) as u64)
    }
}
