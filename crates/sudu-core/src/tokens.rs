//! Token and code issuance
//!
//! Generators only; callers persist what they issue together with an expiry.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Bytes of entropy in an opaque email token
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Inclusive range of six-digit numeric codes
pub const NUMERIC_CODE_MIN: u32 = 100_000;
pub const NUMERIC_CODE_MAX: u32 = 999_999;

pub trait TokenIssuer: Send + Sync {
    /// 256-bit random token, hex-encoded (64 chars)
    fn issue_opaque_token(&self) -> String;

    /// Six-digit decimal code, uniform over 100000..=999999
    fn issue_numeric_code(&self) -> String;
}

/// Issuer backed by the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenIssuer;

impl TokenIssuer for RandomTokenIssuer {
    fn issue_opaque_token(&self) -> String {
        let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn issue_numeric_code(&self) -> String {
        OsRng
            .gen_range(NUMERIC_CODE_MIN..=NUMERIC_CODE_MAX)
            .to_string()
    }
}
