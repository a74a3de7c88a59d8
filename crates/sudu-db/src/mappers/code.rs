//! One-time code entity <-> model mapper

use sudu_core::entities::{CodePurpose, OneTimeCode};
use sudu_core::value_objects::UserId;

use crate::models::OneTimeCodeModel;

/// Table holding codes of the given purpose
pub fn code_table(purpose: CodePurpose) -> &'static str {
    match purpose {
        CodePurpose::AccountLink => "telegram_link_codes",
        CodePurpose::PasswordRecovery => "telegram_codes",
    }
}

impl OneTimeCodeModel {
    /// The table a row came from decides its purpose
    pub fn into_entity(self, purpose: CodePurpose) -> OneTimeCode {
        OneTimeCode {
            id: self.id,
            user_id: UserId::new(self.user_id),
            purpose,
            code: self.code,
            expires_at: self.expires_at,
            used: self.used,
            created_at: self.created_at,
        }
    }
}
