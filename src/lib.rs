//! # Chirpy
//!
//! `chirpy` is the backend for the Chirpy social network: short messages
//! ("chirps") posted by registered users.
//!
//! ## Authentication
//!
//! Passwords are hashed with Argon2 and never stored in the clear. Logins
//! issue a short-lived HS256 access token plus an opaque refresh token that
//! can be exchanged for new access tokens until it expires or is revoked.
//!
//! All credential failures on login collapse into one 401 response so callers
//! cannot tell a missing account from a wrong password.
//!
//! ## Chirps
//!
//! Chirps are limited to 140 characters and filtered for a small set of
//! banned words before storage. Only the author of a chirp may delete it.

pub mod api;
pub mod auth;
pub mod cli;
