//! User entity <-> model mapper

use sudu_core::entities::User;
use sudu_core::value_objects::{ChatId, UserId};

use crate::models::UserModel;

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: UserId::new(model.id),
            name: model.name,
            email: model.email,
            email_verified: model.email_verified,
            telegram_chat_id: model.telegram_chat_id.map(ChatId::new),
            created_at: model.created_at,
        }
    }
}
