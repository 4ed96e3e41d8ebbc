//! Credential extraction from `Authorization` headers.
//!
//! Both bearer tokens and API keys share one scan: walk every `Authorization`
//! value in presentation order and return the first non-empty credential
//! behind a matching scheme keyword. The keyword match is case-insensitive;
//! the credential keeps its original case.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::error::Error;

const BEARER_SCHEME: &str = "Bearer";
const API_KEY_SCHEME: &str = "ApiKey";

/// Extract a bearer access or refresh token.
///
/// # Errors
/// Returns [`Error::NoCredentialFound`] if no header value carries a
/// non-empty `Bearer` credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, Error> {
    credential(headers, BEARER_SCHEME)
}

/// Extract an `ApiKey` credential (webhook callers).
///
/// # Errors
/// Returns [`Error::NoCredentialFound`] if no header value carries a
/// non-empty `ApiKey` credential.
pub fn api_key(headers: &HeaderMap) -> Result<String, Error> {
    credential(headers, API_KEY_SCHEME)
}

fn credential(headers: &HeaderMap, scheme: &str) -> Result<String, Error> {
    for value in headers.get_all(AUTHORIZATION) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let trimmed = value.trim();
        if !matches_scheme(trimmed, scheme) {
            continue;
        }
        // One length computation for both the match and the slice, so the
        // credential keeps its original case.
        let credential = trimmed[scheme.len() + 1..].trim();
        if !credential.is_empty() {
            return Ok(credential.to_string());
        }
        // Right scheme but only whitespace after it: keep scanning.
    }
    Err(Error::NoCredentialFound)
}

/// Case-insensitive `"<scheme> "` prefix check; the separator is exactly one
/// space.
fn matches_scheme(value: &str, scheme: &str) -> bool {
    let bytes = value.as_bytes();
    let scheme_bytes = scheme.as_bytes();
    bytes.len() > scheme_bytes.len()
        && bytes[scheme_bytes.len()] == b' '
        && bytes[..scheme_bytes.len()].eq_ignore_ascii_case(scheme_bytes)
}
