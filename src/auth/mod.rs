//! Credential and session-token core.
//!
//! Four stateless pieces: password hashing ([`password`]), signed access
//! tokens ([`token`]), opaque refresh tokens ([`refresh`]) and
//! `Authorization` header parsing ([`headers`]). Nothing here logs, retries,
//! or talks to storage; callers map errors to HTTP statuses and own the
//! persistence of refresh tokens.

pub mod error;
pub mod headers;
pub mod password;
pub mod refresh;
pub mod token;

pub use error::Error;
