use crate::{
    api,
    auth::{AuthConfig, AuthEngine},
    cli::commands::{secrets, session},
    store::{MemoryStore, PgStore, Store},
    token::TokenConfig,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub secrets: secrets::Options,
    pub session: session::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store: Arc<dyn Store> = if let Some(dsn) = &args.dsn {
        Arc::new(PgStore::connect(dsn).await?)
    } else {
        warn!("No --dsn given, using the in-memory store: tokens and users are lost on restart");
        Arc::new(MemoryStore::new())
    };

    let engine = Arc::new(AuthEngine::new(auth_config(args.secrets, &args.session), store));

    api::new(args.port, engine).await
}

/// Assemble the auth configuration from parsed options.
#[must_use]
pub fn auth_config(secrets: secrets::Options, session: &session::Options) -> AuthConfig {
    let token = TokenConfig::new()
        .with_issuer(session.issuer.clone())
        .with_audience(session.audience.clone())
        .with_user_duration_secs(session.user_token_duration_seconds);

    let mut config = AuthConfig::new(secrets.server_secret, secrets.api_secret, secrets.salt)
        .with_previous_token_secrets(secrets.api_secret_previous)
        .with_token_config(token);
    if let Some(key) = secrets.long_term_key {
        config = config.with_long_term_key(key);
    }
    config
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        (
            "store",
            args.dsn
                .as_deref()
                .map_or_else(|| "memory".to_string(), redact_dsn),
        ),
        (
            "previous_api_secrets",
            args.secrets.api_secret_previous.len().to_string(),
        ),
        (
            "long_term_key_set",
            args.secrets.long_term_key.is_some().to_string(),
        ),
        (
            "user_token_duration_seconds",
            args.session.user_token_duration_seconds.to_string(),
        ),
        ("token_issuer", args.session.issuer.clone()),
        ("token_audience", args.session.audience.clone()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "gatehouse {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
