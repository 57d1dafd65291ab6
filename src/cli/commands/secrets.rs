//! Secrets consumed by the auth flows.
//!
//! All of them can come from the environment so an operator can rotate a
//! secret by restarting with a new value. During a signing-secret rollover the
//! old value moves to `--api-secret-previous`.

use anyhow::{Result, bail};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SERVER_SECRET: &str = "server-secret";
pub const ARG_API_SECRET: &str = "api-secret";
pub const ARG_API_SECRET_PREVIOUS: &str = "api-secret-previous";
pub const ARG_LONG_TERM_KEY: &str = "long-term-key";
pub const ARG_SALT: &str = "salt";

#[derive(Debug, Clone)]
pub struct Options {
    pub server_secret: SecretString,
    pub api_secret: SecretString,
    pub api_secret_previous: Vec<SecretString>,
    pub long_term_key: Option<SecretString>,
    pub salt: SecretString,
}

impl Options {
    /// Parse secret arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let required = |id: &str| -> Result<SecretString> {
            match matches.get_one::<String>(id) {
                Some(value) if !value.trim().is_empty() => Ok(SecretString::from(value.clone())),
                _ => bail!("missing required argument: --{id}"),
            }
        };

        let api_secret_previous = matches
            .get_one::<String>(ARG_API_SECRET_PREVIOUS)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|secret| !secret.is_empty())
                    .map(|secret| SecretString::from(secret.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let long_term_key = matches
            .get_one::<String>(ARG_LONG_TERM_KEY)
            .filter(|value| !value.trim().is_empty())
            .map(|value| SecretString::from(value.clone()));

        Ok(Self {
            server_secret: required(ARG_SERVER_SECRET)?,
            api_secret: required(ARG_API_SECRET)?,
            api_secret_previous,
            long_term_key,
            salt: required(ARG_SALT)?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SERVER_SECRET)
                .long(ARG_SERVER_SECRET)
                .help("Shared secret trusted servers present at /serverlogin")
                .env("GATEHOUSE_SERVER_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_API_SECRET)
                .long(ARG_API_SECRET)
                .help("Secret used to sign new session tokens")
                .env("GATEHOUSE_API_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_API_SECRET_PREVIOUS)
                .long(ARG_API_SECRET_PREVIOUS)
                .help("Comma separated retired signing secrets still accepted for verification")
                .env("GATEHOUSE_API_SECRET_PREVIOUS")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_LONG_TERM_KEY)
                .long(ARG_LONG_TERM_KEY)
                .help("Key that grants a 30 day session at /login/{key}")
                .env("GATEHOUSE_LONG_TERM_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SALT)
                .long(ARG_SALT)
                .help("Installation salt for password and correlation id hashing")
                .env("GATEHOUSE_SALT")
                .hide_env_values(true),
        )
}
