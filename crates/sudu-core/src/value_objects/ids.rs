//! Identifiers for users and Telegram chats
//!
//! `UserId` is assigned by the store (BIGSERIAL) and is opaque to callers.
//! `ChatId` is Telegram's numeric chat identifier; group chats are negative.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Store-generated user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Telegram chat identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| IdParseError::InvalidFormat)
    }
}

/// Error when parsing an identifier from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid identifier format")]
    InvalidFormat,
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ChatId> for i64 {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ChatId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatId::parse(s)
    }
}

// Bots and browsers send chat ids either as JSON numbers or as strings
impl<'de> Deserialize<'de> for ChatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ChatIdVisitor;

        impl Visitor<'_> for ChatIdVisitor {
            type Value = ChatId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a chat id")
            }

            fn visit_i64<E>(self, value: i64) -> Result<ChatId, E>
            where
                E: de::Error,
            {
                Ok(ChatId(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<ChatId, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(ChatId)
                    .map_err(|_| de::Error::custom("chat id out of range"))
            }

            fn visit_str<E>(self, value: &str) -> Result<ChatId, E>
            where
                E: de::Error,
            {
                ChatId::parse(value).map_err(|_| de::Error::custom("invalid chat id string"))
            }
        }

        deserializer.deserialize_any(ChatIdVisitor)
    }
}
