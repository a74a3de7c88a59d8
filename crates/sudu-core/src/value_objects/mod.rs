//! Value objects - identifiers shared across layers

mod ids;

pub use ids::{ChatId, IdParseError, UserId};
