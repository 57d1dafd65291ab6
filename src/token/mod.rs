//! Signed session tokens.
//!
//! A session token is a compact HS256 JWT. The signed string is its own
//! identity: there is no separate random id, and the store keys records by the
//! token string.
//!
//! ## Secret rotation
//!
//! Verification takes an ordered list of candidate secrets and accepts the
//! first one whose MAC matches. During a rollover the new secret signs, and the
//! retired one stays in the candidate list until tokens issued under it expire.

mod claims;
mod error;
mod jwt;

pub use claims::{ServerFlag, SessionClaims, TokenHeader};
pub use error::Error;
pub use jwt::{create_token, verify_token};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default lifetime of a server token: 24 hours.
pub const SERVER_TOKEN_DURATION_SECS: i64 = 24 * 60 * 60;
/// Default lifetime of a user token when nothing else is configured.
pub const DEFAULT_USER_TOKEN_DURATION_SECS: i64 = 60 * 60;

const DEFAULT_ISSUER: &str = "localhost";
const DEFAULT_AUDIENCE: &str = "localhost";

/// Semantic content of a session token.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenData {
    #[serde(rename = "isserver")]
    pub is_server: bool,
    #[serde(rename = "userid")]
    pub user_id: String,
    /// Requested lifetime; `0` selects the default for the principal kind.
    #[serde(skip)]
    pub duration_secs: i64,
}

impl TokenData {
    #[must_use]
    pub fn user(user_id: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            is_server: false,
            user_id: user_id.into(),
            duration_secs,
        }
    }

    #[must_use]
    pub fn server(server_name: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            is_server: true,
            user_id: server_name.into(),
            duration_secs,
        }
    }
}

/// An issued token together with its validity window.
///
/// `expires_at` is fixed at creation. Refreshing produces a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub is_server: bool,
    pub principal_id: String,
    pub duration_secs: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

impl SessionToken {
    #[must_use]
    pub fn data(&self) -> TokenData {
        TokenData {
            is_server: self.is_server,
            user_id: self.principal_id.clone(),
            duration_secs: self.duration_secs,
        }
    }
}

/// Issuance parameters that are not secret.
#[derive(Clone, Debug)]
pub struct TokenConfig {
    issuer: String,
    audience: String,
    user_duration_secs: i64,
}

impl TokenConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            user_duration_secs: DEFAULT_USER_TOKEN_DURATION_SECS,
        }
    }

    /// An empty issuer falls back to `localhost`.
    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        if !issuer.is_empty() {
            self.issuer = issuer;
        }
        self
    }

    /// An empty audience falls back to `localhost`.
    #[must_use]
    pub fn with_audience(mut self, audience: String) -> Self {
        if !audience.is_empty() {
            self.audience = audience;
        }
        self
    }

    #[must_use]
    pub fn with_user_duration_secs(mut self, seconds: i64) -> Self {
        self.user_duration_secs = seconds;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn user_duration_secs(&self) -> i64 {
        self.user_duration_secs
    }

    /// Resolve the lifetime for `data`, applying the per-kind default when the
    /// request carries `0`.
    #[must_use]
    pub fn effective_duration(&self, data: &TokenData) -> i64 {
        match (data.duration_secs, data.is_server) {
            (0, true) => SERVER_TOKEN_DURATION_SECS,
            (0, false) => self.user_duration_secs,
            (explicit, _) => explicit,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}
