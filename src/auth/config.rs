//! Secrets and token policy for the auth flows.

use secrecy::{ExposeSecret, SecretString};

use crate::token::TokenConfig;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    server_secret: SecretString,
    token_secret: SecretString,
    previous_token_secrets: Vec<SecretString>,
    long_term_key: Option<SecretString>,
    salt: SecretString,
    token: TokenConfig,
}

impl AuthConfig {
    /// `server_secret` authenticates server logins, `token_secret` signs new
    /// tokens, and `salt` seeds password and correlation-id hashing.
    #[must_use]
    pub fn new(server_secret: SecretString, token_secret: SecretString, salt: SecretString) -> Self {
        Self {
            server_secret,
            token_secret,
            previous_token_secrets: Vec::new(),
            long_term_key: None,
            salt,
            token: TokenConfig::new(),
        }
    }

    /// Retired signing secrets still accepted for verification.
    #[must_use]
    pub fn with_previous_token_secrets(mut self, secrets: Vec<SecretString>) -> Self {
        self.previous_token_secrets = secrets
            .into_iter()
            .filter(|secret| !secret.expose_secret().is_empty())
            .collect();
        self
    }

    /// An empty key disables the long-term exemption.
    #[must_use]
    pub fn with_long_term_key(mut self, key: SecretString) -> Self {
        self.long_term_key = if key.expose_secret().is_empty() {
            None
        } else {
            Some(key)
        };
        self
    }

    #[must_use]
    pub fn with_token_config(mut self, token: TokenConfig) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn token(&self) -> &TokenConfig {
        &self.token
    }

    pub(super) fn server_secret(&self) -> &[u8] {
        self.server_secret.expose_secret().as_bytes()
    }

    pub(super) fn signing_secret(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }

    /// Current secret first, then retired ones in configured order.
    pub(super) fn verification_secrets(&self) -> Vec<&[u8]> {
        std::iter::once(&self.token_secret)
            .chain(self.previous_token_secrets.iter())
            .map(|secret| secret.expose_secret().as_bytes())
            .collect()
    }

    pub(super) fn long_term_key(&self) -> Option<&[u8]> {
        self.long_term_key
            .as_ref()
            .map(|key| key.expose_secret().as_bytes())
    }

    pub(super) fn salt(&self) -> &str {
        self.salt.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("server"),
            SecretString::from("current"),
            SecretString::from("salt"),
        )
    }

    #[test]
    fn verification_secrets_put_current_first() {
        let config = config().with_previous_token_secrets(vec![
            SecretString::from("old"),
            SecretString::from(""),
            SecretString::from("older"),
        ]);
        let secrets = config.verification_secrets();
        assert_eq!(
            secrets,
            vec![b"current".as_slice(), b"old".as_slice(), b"older".as_slice()]
        );
        assert_eq!(config.signing_secret(), b"current");
    }

    #[test]
    fn empty_long_term_key_is_disabled() {
        let config = config().with_long_term_key(SecretString::from(""));
        assert!(config.long_term_key().is_none());

        let config = config.with_long_term_key(SecretString::from("the long term key"));
        assert_eq!(config.long_term_key(), Some(b"the long term key".as_slice()));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("current"));
        assert!(!rendered.contains("server\""));
    }
}
