//! End-to-end exercises of the auth building blocks as a library consumer
//! sees them: hash a password, log a user in, mint and validate tokens, and
//! parse the Authorization header the way the HTTP layer does.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use chirpy::auth::{Error, headers, password, refresh, token};
use uuid::Uuid;

const SECRET: &[u8] = b"integration-secret";

#[test]
fn signup_then_login_flow() {
    let stored = password::hash("correct horse battery staple").unwrap();

    assert!(password::verify("correct horse battery staple", &stored).unwrap());
    assert!(!password::verify("Tr0ub4dor&3", &stored).unwrap());
}

#[test]
fn access_token_round_trip_through_headers() {
    let user = Uuid::new_v4();
    let minted = token::mint(user, SECRET, token::DEFAULT_TTL_SECONDS).unwrap();

    let mut headers_map = HeaderMap::new();
    headers_map.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {minted}")).unwrap(),
    );

    let extracted = headers::bearer_token(&headers_map).unwrap();
    assert_eq!(token::validate(&extracted, SECRET), Ok(user));
}

#[test]
fn access_token_rejected_with_other_secret() {
    let user = Uuid::new_v4();
    let minted = token::mint(user, SECRET, token::DEFAULT_TTL_SECONDS).unwrap();

    assert_eq!(
        token::validate(&minted, b"some-other-secret"),
        Err(Error::MalformedToken)
    );
}

#[test]
fn expired_access_token_rejected() {
    let user = Uuid::new_v4();
    let now = 1_700_000_000;
    let minted = token::mint_at(user, SECRET, now, 60).unwrap();

    assert_eq!(token::validate_at(&minted, SECRET, now + 59), Ok(user));
    assert_eq!(
        token::validate_at(&minted, SECRET, now + 60),
        Err(Error::ExpiredToken)
    );
}

#[test]
fn refresh_token_lifecycle() {
    let generated = refresh::generate().unwrap();
    assert_eq!(generated.len(), 64);
    assert!(generated.chars().all(|c| c.is_ascii_hexdigit()));

    let now = 1_700_000_000;
    let record = refresh::RefreshTokenRecord {
        user_id: Uuid::new_v4(),
        created_at_unix: now,
        expires_at_unix: now + refresh::TTL_SECONDS,
        revoked_at_unix: None,
    };
    assert!(refresh::is_valid(&record, now));
    assert!(!refresh::is_valid(&record, now + refresh::TTL_SECONDS));

    let revoked = refresh::RefreshTokenRecord {
        revoked_at_unix: Some(now + 1),
        ..record
    };
    assert!(!refresh::is_valid(&revoked, now + 2));
}

#[test]
fn api_key_and_bearer_are_distinct_schemes() {
    let mut headers_map = HeaderMap::new();
    headers_map.insert(
        AUTHORIZATION,
        HeaderValue::from_static("ApiKey f271c81ff7084ee5b99a5091b42d486e"),
    );

    assert_eq!(
        headers::api_key(&headers_map).as_deref(),
        Ok("f271c81ff7084ee5b99a5091b42d486e")
    );
    assert_eq!(
        headers::bearer_token(&headers_map),
        Err(Error::NoCredentialFound)
    );
}
