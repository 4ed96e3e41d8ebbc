//! Signed access tokens.
//!
//! Access tokens are stateless HS256 JWTs: base64url-unpadded header and
//! claims JSON, HMAC-SHA256 signature keyed by the shared signing secret.
//! Nothing is persisted; validity is computable from the token string and the
//! secret alone. There is no revocation, compromise is bounded by the short
//! expiry.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// Issuer claim embedded in every access token and checked on validation.
pub const ISSUER: &str = "chirpy-access";

/// Default access token lifetime.
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct AccessTokenHeader {
    alg: String,
    typ: String,
}

impl AccessTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct AccessTokenClaims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value).map_err(|_| Error::MalformedToken)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| Error::MalformedToken)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

/// Mint an access token for `subject`, expiring `ttl_seconds` from now.
///
/// # Errors
/// Returns an error if the header or claims cannot be encoded.
pub fn mint(subject: Uuid, secret: &[u8], ttl_seconds: i64) -> Result<String, Error> {
    mint_at(subject, secret, unix_now(), ttl_seconds)
}

/// Mint an access token with an explicit issued-at instant.
///
/// # Errors
/// Returns an error if the header or claims cannot be encoded.
pub fn mint_at(
    subject: Uuid,
    secret: &[u8],
    now_unix_seconds: i64,
    ttl_seconds: i64,
) -> Result<String, Error> {
    let claims = AccessTokenClaims {
        iss: ISSUER.to_string(),
        sub: subject.to_string(),
        iat: now_unix_seconds,
        exp: now_unix_seconds + ttl_seconds,
    };

    let header_b64 = b64e_json(&AccessTokenHeader::hs256())?;
    let claims_b64 = b64e_json(&claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| Error::MalformedToken)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Validate an access token and return its subject.
///
/// # Errors
/// Returns [`Error::MalformedToken`], [`Error::WrongIssuer`],
/// [`Error::ExpiredToken`] or [`Error::InvalidSubject`]; see [`validate_at`].
pub fn validate(token: &str, secret: &[u8]) -> Result<Uuid, Error> {
    validate_at(token, secret, unix_now())
}

/// Validate an access token against an explicit clock.
///
/// The signature is verified before any claim is inspected, so a forged token
/// cannot probe issuer or expiry branches. Check order after that: issuer,
/// expiry, subject.
///
/// # Errors
/// - [`Error::MalformedToken`] if the string does not parse or the signature
///   does not verify,
/// - [`Error::WrongIssuer`] if the issuer claim differs from [`ISSUER`],
/// - [`Error::ExpiredToken`] if the expiry instant has passed,
/// - [`Error::InvalidSubject`] if the subject is not a well-formed user id.
pub fn validate_at(token: &str, secret: &[u8], now_unix_seconds: i64) -> Result<Uuid, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::MalformedToken)?;
    let claims_b64 = parts.next().ok_or(Error::MalformedToken)?;
    let sig_b64 = parts.next().ok_or(Error::MalformedToken)?;
    if parts.next().is_some() {
        return Err(Error::MalformedToken);
    }

    let header: AccessTokenHeader = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::MalformedToken);
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature_bytes =
        Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::MalformedToken)?;
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| Error::MalformedToken)?;
    mac.update(signing_input.as_bytes());
    // Constant-time comparison; claims stay opaque until this passes.
    mac.verify_slice(&signature_bytes)
        .map_err(|_| Error::MalformedToken)?;

    let claims: AccessTokenClaims = b64d_json(claims_b64)?;
    if claims.iss != ISSUER {
        return Err(Error::WrongIssuer);
    }
    if claims.exp <= now_unix_seconds {
        return Err(Error::ExpiredToken);
    }
    Uuid::parse_str(&claims.sub).map_err(|_| Error::InvalidSubject)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const SECRET: &[u8] = b"test-signing-secret";

    fn user() -> Uuid {
        Uuid::parse_str("4b4fdba3-9ba7-4b66-8c6a-164f4b9dbe62").unwrap()
    }

    #[test]
    fn mint_and_validate_round_trip() -> Result<(), Error> {
        let token = mint_at(user(), SECRET, NOW, 3600)?;
        let subject = validate_at(&token, SECRET, NOW)?;
        assert_eq!(subject, user());
        Ok(())
    }

    #[test]
    fn minting_is_deterministic_for_fixed_inputs() -> Result<(), Error> {
        let first = mint_at(user(), SECRET, NOW, 3600)?;
        let second = mint_at(user(), SECRET, NOW, 3600)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn negative_ttl_is_already_expired() -> Result<(), Error> {
        let token = mint_at(user(), SECRET, NOW, -1)?;
        let result = validate_at(&token, SECRET, NOW);
        assert!(matches!(result, Err(Error::ExpiredToken)));
        Ok(())
    }

    #[test]
    fn expires_after_ttl_elapses() -> Result<(), Error> {
        let token = mint_at(user(), SECRET, NOW, 3600)?;
        assert!(validate_at(&token, SECRET, NOW + 3599).is_ok());
        let result = validate_at(&token, SECRET, NOW + 3600);
        assert!(matches!(result, Err(Error::ExpiredToken)));
        Ok(())
    }

    #[test]
    fn wrong_secret_is_rejected_before_claims() -> Result<(), Error> {
        // Expired token + wrong secret: the signature failure must win,
        // otherwise claim contents leak past a forged signature.
        let token = mint_at(user(), SECRET, NOW, -1)?;
        let result = validate_at(&token, b"other-secret", NOW);
        assert!(matches!(result, Err(Error::MalformedToken)));
        Ok(())
    }

    #[test]
    fn tampered_claims_are_rejected() -> Result<(), Error> {
        let token = mint_at(user(), SECRET, NOW, 3600)?;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = b64e_json(&AccessTokenClaims {
            iss: "someone-else".to_string(),
            sub: user().to_string(),
            iat: NOW,
            exp: NOW + 3600,
        })?;
        parts[1] = &forged_claims;
        let forged = parts.join(".");
        // Forged issuer without the secret fails the signature check, not the
        // issuer check.
        let result = validate_at(&forged, SECRET, NOW);
        assert!(matches!(result, Err(Error::MalformedToken)));
        Ok(())
    }

    #[test]
    fn wrong_issuer_signed_with_real_secret() -> Result<(), Error> {
        // Only the holder of the secret can produce this; tokens minted through
        // `mint` always carry the right issuer by construction.
        let header_b64 = b64e_json(&AccessTokenHeader::hs256())?;
        let claims_b64 = b64e_json(&AccessTokenClaims {
            iss: "not-chirpy".to_string(),
            sub: user().to_string(),
            iat: NOW,
            exp: NOW + 3600,
        })?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
        mac.update(signing_input.as_bytes());
        let sig = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        let token = format!("{signing_input}.{sig}");

        let result = validate_at(&token, SECRET, NOW);
        assert!(matches!(result, Err(Error::WrongIssuer)));
        Ok(())
    }

    #[test]
    fn bad_subject_signed_with_real_secret() -> Result<(), Error> {
        let header_b64 = b64e_json(&AccessTokenHeader::hs256())?;
        let claims_b64 = b64e_json(&AccessTokenClaims {
            iss: ISSUER.to_string(),
            sub: "not-a-uuid".to_string(),
            iat: NOW,
            exp: NOW + 3600,
        })?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
        mac.update(signing_input.as_bytes());
        let sig = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        let token = format!("{signing_input}.{sig}");

        let result = validate_at(&token, SECRET, NOW);
        assert!(matches!(result, Err(Error::InvalidSubject)));
        Ok(())
    }

    #[test]
    fn garbage_strings_are_malformed() {
        for garbage in ["", "a.b", "a.b.c.d", "not a token", "a.b.c"] {
            let result = validate_at(garbage, SECRET, NOW);
            assert!(
                matches!(result, Err(Error::MalformedToken)),
                "expected malformed for {garbage:?}"
            );
        }
    }
}
