//! Login, refresh, logout and gating decisions.
//!
//! Flow Overview:
//! 1) Extract credentials (Basic auth, server headers or a session token).
//! 2) Check them against the user directory or the configured secrets.
//! 3) Mint a token with the codec and persist it, or verify an existing one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use super::{AuthConfig, AuthError, constant_time_eq, parse_basic_auth};
use crate::hash::{IdHashPair, hash_password};
use crate::store::{Store, User, UserQuery};
use crate::token::{
    self, SERVER_TOKEN_DURATION_SECS, SessionToken, TokenData, create_token, verify_token,
};

/// User tokens issued for longer than this are not renewed by refresh.
pub const NON_RENEWABLE_AFTER_SECS: i64 = 2 * 60 * 60;
/// Lifetime granted to a login that presents the long-term key.
pub const LONG_TERM_DURATION_SECS: i64 = 30 * 24 * 60 * 60;

/// Result of a refresh request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A replacement token was minted and persisted.
    Renewed(SessionToken),
    /// The presented token is a long-lived user token; nothing was minted.
    NonRenewable(TokenData),
}

pub struct AuthEngine {
    config: AuthConfig,
    store: Arc<dyn Store>,
}

impl AuthEngine {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Authenticate a user from a Basic `Authorization` header.
    ///
    /// `requested_duration` comes from the `tokenduration` header. It only
    /// applies when positive and is capped at the configured user duration.
    /// A matching `long_term_key` overrides it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::BadRequest`] for a malformed header or empty name/password,
    /// - [`AuthError::Unauthorized`] for an unknown user or wrong password,
    /// - [`AuthError::Storage`] if the directory or token store fails.
    pub async fn login(
        &self,
        authorization: Option<&str>,
        requested_duration: i64,
        long_term_key: Option<&str>,
    ) -> Result<(SessionToken, User), AuthError> {
        let credentials = parse_basic_auth(authorization)?;
        if credentials.name.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::BadRequest("missing credentials"));
        }

        let Some(user) = self
            .store
            .find_user(&UserQuery::ByName(credentials.name.clone()))
            .await?
        else {
            debug!("Login rejected: unknown user");
            return Err(AuthError::Unauthorized("invalid credentials"));
        };

        let pw_hash = hash_password(&user.id, &credentials.password, self.config.salt())?;
        if !constant_time_eq(pw_hash.as_bytes(), user.pw_hash.as_bytes()) {
            debug!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(AuthError::Unauthorized("invalid credentials"));
        }

        let duration_secs = match long_term_key.and_then(|key| self.validate_longterm(key)) {
            Some(long_term) => long_term,
            None => bounded_duration(
                requested_duration,
                self.config.token().user_duration_secs(),
            ),
        };

        let session = self
            .issue(TokenData::user(user.id.clone(), duration_secs))
            .await?;
        info!(user_id = %user.id, duration_secs = session.duration_secs, "User logged in");
        Ok((session, user))
    }

    /// Authenticate a trusted server by name and shared secret.
    ///
    /// # Errors
    ///
    /// - [`AuthError::BadRequest`] when either header is empty,
    /// - [`AuthError::Unauthorized`] when the secret does not match (no store
    ///   write happens),
    /// - [`AuthError::Storage`] if the token cannot be persisted.
    pub async fn server_login(
        &self,
        server_name: &str,
        server_secret: &str,
        requested_duration: i64,
    ) -> Result<SessionToken, AuthError> {
        if server_name.is_empty() || server_secret.is_empty() {
            return Err(AuthError::BadRequest("missing server credentials"));
        }
        if !constant_time_eq(server_secret.as_bytes(), self.config.server_secret()) {
            warn!(server = %server_name, "Server login rejected: bad secret");
            return Err(AuthError::Unauthorized("invalid server credentials"));
        }

        let session = self
            .issue(TokenData::server(
                server_name,
                bounded_duration(requested_duration, SERVER_TOKEN_DURATION_SECS),
            ))
            .await?;
        info!(server = %server_name, "Server logged in");
        Ok(session)
    }

    /// Exchange a live token for a fresh one.
    ///
    /// The token must verify and still be present in the store. The previous
    /// token is left to expire on its own.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for a missing, invalid, expired or
    /// revoked token, and [`AuthError::Storage`] on store failures.
    pub async fn refresh(&self, token: Option<&str>) -> Result<RefreshOutcome, AuthError> {
        let token = token
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::Unauthorized("missing session token"))?;
        let data = self.verify(token).map_err(|err| {
            debug!("Refresh rejected: {err}");
            AuthError::Unauthorized("invalid session token")
        })?;
        if self.store.find_token(token).await?.is_none() {
            debug!(user_id = %data.user_id, "Refresh rejected: token revoked");
            return Err(AuthError::Unauthorized("invalid session token"));
        }

        if !data.is_server && data.duration_secs > NON_RENEWABLE_AFTER_SECS {
            return Ok(RefreshOutcome::NonRenewable(data));
        }

        let renewed = TokenData {
            is_server: data.is_server,
            user_id: data.user_id,
            duration_secs: 0,
        };
        let session = self.issue(renewed).await?;
        debug!(user_id = %session.principal_id, "Session refreshed");
        Ok(RefreshOutcome::Renewed(session))
    }

    /// Revoke `token` if present. Always succeeds from the caller's view.
    pub async fn logout(&self, token: Option<&str>) {
        let Some(token) = token.filter(|value| !value.is_empty()) else {
            return;
        };
        if let Err(err) = self.store.remove_token(token).await {
            error!("Failed to remove session token: {err}");
        }
    }

    /// Stateless gate for privileged routes: signature, expiry and server kind.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] unless the token is a valid server
    /// token.
    pub fn require_server_token(&self, token: Option<&str>) -> Result<TokenData, AuthError> {
        let token = token
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::Unauthorized("missing session token"))?;
        let data = self.verify(token).map_err(|err| {
            debug!("Server token rejected: {err}");
            AuthError::Unauthorized("invalid session token")
        })?;
        if !data.is_server {
            debug!(user_id = %data.user_id, "Server token rejected: user token");
            return Err(AuthError::Unauthorized("server token required"));
        }
        Ok(data)
    }

    /// Decode `token` if it verifies and has not been revoked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] when the token is missing, invalid or
    /// absent from the store, and [`AuthError::Storage`] on store failures.
    pub async fn server_check_token(&self, token: Option<&str>) -> Result<TokenData, AuthError> {
        let token = token
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::NotFound("token"))?;
        let data = self.verify(token).map_err(|err| {
            debug!("Token check failed: {err}");
            AuthError::NotFound("token")
        })?;
        if self.store.find_token(token).await?.is_none() {
            return Err(AuthError::NotFound("token"));
        }
        Ok(data)
    }

    /// Duration granted by `key`, if it matches the configured long-term key.
    #[must_use]
    pub fn validate_longterm(&self, key: &str) -> Option<i64> {
        let expected = self.config.long_term_key()?;
        if key.is_empty() || !constant_time_eq(key.as_bytes(), expected) {
            debug!("Long-term key rejected");
            return None;
        }
        Some(LONG_TERM_DURATION_SECS)
    }

    /// Fresh correlation pair seeded from request parameters only.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::BadRequest`] when `params` is empty.
    pub fn anonymous_id_hash_pair(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<IdHashPair, AuthError> {
        if params.is_empty() {
            return Err(AuthError::BadRequest("query parameters are required"));
        }
        Ok(IdHashPair::derive(&[self.config.salt().to_string()], params)?)
    }

    /// Return the pair stored under `key` for the user, creating it if absent.
    ///
    /// Two concurrent first requests for the same key may both derive a pair;
    /// the last upsert wins and the other caller's value is not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] for an unknown user and
    /// [`AuthError::Storage`] on store failures.
    pub async fn get_or_create_id_hash_pair(
        &self,
        user_id: &str,
        key: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<IdHashPair, AuthError> {
        let user = self.find_user(user_id).await?;
        if let Some(pair) = user.private.get(key) {
            return Ok(pair.clone());
        }
        self.store_id_hash_pair(user, key, params).await
    }

    /// Replace the pair stored under `key` with a freshly derived one.
    ///
    /// # Errors
    ///
    /// Same as [`AuthEngine::get_or_create_id_hash_pair`].
    pub async fn regenerate_id_hash_pair(
        &self,
        user_id: &str,
        key: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<IdHashPair, AuthError> {
        let user = self.find_user(user_id).await?;
        self.store_id_hash_pair(user, key, params).await
    }

    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] when no user has `user_id`.
    pub async fn find_user(&self, user_id: &str) -> Result<User, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::NotFound("user"));
        }
        self.store
            .find_user(&UserQuery::ById(user_id.to_string()))
            .await?
            .ok_or(AuthError::NotFound("user"))
    }

    async fn store_id_hash_pair(
        &self,
        mut user: User,
        key: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<IdHashPair, AuthError> {
        let seeds = [
            self.config.salt().to_string(),
            user.id.clone(),
            key.to_string(),
        ];
        let pair = IdHashPair::derive(&seeds, params)?;
        user.private.insert(key.to_string(), pair.clone());
        self.store.upsert_user(&user).await?;
        debug!(user_id = %user.id, key, "Stored id hash pair");
        Ok(pair)
    }

    async fn issue(&self, data: TokenData) -> Result<SessionToken, AuthError> {
        let session = create_token(
            &data,
            self.config.signing_secret(),
            self.config.token(),
            unix_now(),
        )?;
        self.store.add_token(&session).await?;
        Ok(session)
    }

    fn verify(&self, token: &str) -> Result<TokenData, token::Error> {
        verify_token(token, &self.config.verification_secrets(), unix_now())
    }
}

/// A caller may shorten a session, never extend it past `ceiling`. Non-positive
/// requests select the default.
fn bounded_duration(requested: i64, ceiling: i64) -> i64 {
    if requested > 0 {
        requested.min(ceiling)
    } else {
        0
    }
}

fn unix_now() -> i64 {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(seconds).unwrap_or(i64::MAX)
}
