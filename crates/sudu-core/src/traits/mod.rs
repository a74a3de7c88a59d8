//! Ports - the interfaces the protocol layer depends on

mod clock;
mod notification;
mod repositories;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notification::{MessageId, NotificationChannel};
pub use repositories::{
    EmailTokenRepository, OneTimeCodeRepository, PendingRegistrationRepository, RepoResult,
    UserRepository,
};
