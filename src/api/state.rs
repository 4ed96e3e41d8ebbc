//! API configuration and shared request state.

use secrecy::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::auth::{refresh, token};

#[derive(Clone, Debug)]
pub struct ApiConfig {
    jwt_secret: SecretString,
    polka_key: SecretString,
    platform: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl ApiConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, polka_key: SecretString, platform: String) -> Self {
        Self {
            jwt_secret,
            polka_key,
            platform,
            access_ttl_seconds: token::DEFAULT_TTL_SECONDS,
            refresh_ttl_seconds: refresh::TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    /// Shared secret for access-token signing; established once at startup and
    /// only read afterwards.
    pub(crate) fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }

    pub(crate) fn polka_key(&self) -> &str {
        self.polka_key.expose_secret()
    }

    pub(super) fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub(super) fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    pub(super) fn is_dev_platform(&self) -> bool {
        self.platform == "dev"
    }
}

/// Process-wide state threaded through handlers via `Extension<Arc<ApiState>>`.
pub struct ApiState {
    config: ApiConfig,
    hits: AtomicU64,
}

impl ApiState {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            hits: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_hits(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}
