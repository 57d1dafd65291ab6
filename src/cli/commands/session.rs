use clap::{Arg, ArgMatches, Command};

use crate::token::DEFAULT_USER_TOKEN_DURATION_SECS;

pub const ARG_USER_TOKEN_DURATION: &str = "user-token-duration-seconds";
pub const ARG_TOKEN_ISSUER: &str = "token-issuer";
pub const ARG_TOKEN_AUDIENCE: &str = "token-audience";

#[derive(Debug, Clone)]
pub struct Options {
    pub user_token_duration_seconds: i64,
    pub issuer: String,
    pub audience: String,
}

impl Options {
    /// Parse token policy arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the user token duration is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let user_token_duration_seconds = matches
            .get_one::<i64>(ARG_USER_TOKEN_DURATION)
            .copied()
            .unwrap_or(DEFAULT_USER_TOKEN_DURATION_SECS);
        if user_token_duration_seconds <= 0 {
            anyhow::bail!("--{ARG_USER_TOKEN_DURATION} must be positive");
        }

        // Empty values fall back to the codec defaults.
        let get_or_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            user_token_duration_seconds,
            issuer: get_or_empty(ARG_TOKEN_ISSUER),
            audience: get_or_empty(ARG_TOKEN_AUDIENCE),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USER_TOKEN_DURATION)
                .long(ARG_USER_TOKEN_DURATION)
                .help("Default lifetime of user session tokens in seconds")
                .env("GATEHOUSE_USER_TOKEN_DURATION_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TOKEN_ISSUER)
                .long(ARG_TOKEN_ISSUER)
                .help("Issuer (iss) written into session tokens")
                .env("GATEHOUSE_TOKEN_ISSUER")
                .default_value("localhost"),
        )
        .arg(
            Arg::new(ARG_TOKEN_AUDIENCE)
                .long(ARG_TOKEN_AUDIENCE)
                .help("Audience (aud) written into session tokens")
                .env("GATEHOUSE_TOKEN_AUDIENCE")
                .default_value("localhost"),
        )
}
