//! Pending registration entity <-> model mapper

use sudu_core::entities::PendingRegistration;

use crate::models::PendingRegistrationModel;

impl From<PendingRegistrationModel> for PendingRegistration {
    fn from(model: PendingRegistrationModel) -> Self {
        PendingRegistration {
            id: model.id,
            name: model.name,
            email: model.email,
            link_code: model.link_code,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}
