//! Password hashing and verification.
//!
//! Hashes are PHC strings (algorithm, parameters, salt and digest in one
//! self-describing value), so verification needs nothing beyond the stored
//! string itself.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use super::error::Error;

/// Hash a plaintext password with argon2id and a fresh random salt.
///
/// # Errors
/// Returns [`Error::HashingFailure`] if the hasher or its RNG fails.
pub fn hash(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| Error::HashingFailure)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash string.
///
/// A mismatch is `Ok(false)`, never an error; the digest comparison inside
/// argon2 is constant-time.
///
/// # Errors
/// Returns [`Error::MalformedHash`] if the stored value is not a well-formed
/// PHC string.
pub fn verify(password: &str, stored_hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| Error::MalformedHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() -> Result<(), Error> {
        let hashed = hash("correctPassword123!")?;
        assert!(verify("correctPassword123!", &hashed)?);
        Ok(())
    }

    #[test]
    fn wrong_password_is_mismatch_not_error() -> Result<(), Error> {
        let hashed = hash("correctPassword123!")?;
        assert!(!verify("wrongPassword", &hashed)?);
        Ok(())
    }

    #[test]
    fn mismatch_against_other_users_hash() -> Result<(), Error> {
        let hashed = hash("anotherPassword456!")?;
        assert!(!verify("correctPassword123!", &hashed)?);
        Ok(())
    }

    #[test]
    fn empty_password_is_mismatch() -> Result<(), Error> {
        let hashed = hash("correctPassword123!")?;
        assert!(!verify("", &hashed)?);
        Ok(())
    }

    #[test]
    fn malformed_hash_is_error() {
        let result = verify("anything", "invalidhash");
        assert!(matches!(result, Err(Error::MalformedHash)));
    }

    #[test]
    fn same_password_hashes_differently() -> Result<(), Error> {
        let first = hash("correctPassword123!")?;
        let second = hash("correctPassword123!")?;
        assert_ne!(first, second);
        assert!(verify("correctPassword123!", &first)?);
        assert!(verify("correctPassword123!", &second)?);
        Ok(())
    }
}
