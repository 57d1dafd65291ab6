//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action that starts the API server with
//! its secrets and token policy.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_PORT, secrets, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .filter(|value| !value.trim().is_empty());

    Ok(Action::Server(Args {
        port,
        dsn,
        secrets: secrets::Options::parse(matches)?,
        session: session::Options::parse(matches)?,
    }))
}
