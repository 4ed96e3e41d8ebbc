//! Opaque refresh tokens and their validity policy.
//!
//! A refresh token is 32 bytes from the OS CSPRNG, hex-encoded. The token is
//! the credential; the database stores it with its owner and expiry. Tokens
//! are not rotated on use: the same token mints access tokens until it expires
//! or is revoked.

use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

use super::error::Error;

/// Refresh token lifetime: 60 days.
pub const TTL_SECONDS: i64 = 60 * 24 * 60 * 60;

/// Raw entropy per token; hex-encoded to 64 characters.
const TOKEN_BYTES: usize = 32;

/// Persisted state of one refresh token, times in unix seconds.
///
/// `revoked_at_unix` is terminal: once set it is never cleared. Expiry is
/// implicit, a token past `expires_at_unix` simply stops satisfying
/// [`is_valid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub created_at_unix: i64,
    pub expires_at_unix: i64,
    pub revoked_at_unix: Option<i64>,
}

/// Generate a new refresh token.
///
/// Collisions over 256 bits are treated as impossible and never checked
/// against storage.
///
/// # Errors
/// Returns [`Error::RandomSourceFailure`] if the OS random source fails.
pub fn generate() -> Result<String, Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| Error::RandomSourceFailure)?;
    Ok(hex::encode(bytes))
}

/// Whether a refresh token may still be exchanged for access tokens.
///
/// This predicate is the single source of truth; the storage layer applies the
/// equivalent SQL filter so expired or revoked rows read as absent.
#[must_use]
pub fn is_valid(record: &RefreshTokenRecord, now_unix_seconds: i64) -> bool {
    record.revoked_at_unix.is_none() && record.expires_at_unix > now_unix_seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn fresh_record() -> RefreshTokenRecord {
        RefreshTokenRecord {
            user_id: Uuid::nil(),
            created_at_unix: NOW,
            expires_at_unix: NOW + TTL_SECONDS,
            revoked_at_unix: None,
        }
    }

    #[test]
    fn generate_is_64_hex_chars() -> Result<(), Error> {
        let token = generate()?;
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        Ok(())
    }

    #[test]
    fn generate_does_not_repeat() -> Result<(), Error> {
        assert_ne!(generate()?, generate()?);
        Ok(())
    }

    #[test]
    fn fresh_token_is_valid() {
        assert!(is_valid(&fresh_record(), NOW));
        assert!(is_valid(&fresh_record(), NOW + TTL_SECONDS - 1));
    }

    #[test]
    fn revoked_token_is_invalid() {
        let mut record = fresh_record();
        record.revoked_at_unix = Some(NOW + 10);
        assert!(!is_valid(&record, NOW + 11));
        // Revocation wins even before the expiry horizon.
        assert!(!is_valid(&record, NOW));
    }

    #[test]
    fn expired_token_is_invalid_without_revocation() {
        let record = fresh_record();
        assert!(!is_valid(&record, NOW + TTL_SECONDS));
        assert!(!is_valid(&record, NOW + TTL_SECONDS + 1));
    }

    #[test]
    fn expiry_is_strictly_after_creation() {
        let record = fresh_record();
        assert!(record.expires_at_unix > record.created_at_unix);
    }
}
