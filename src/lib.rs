//! # Gatehouse (Session Token Service)
//!
//! `gatehouse` issues, verifies, refreshes and revokes signed session tokens
//! for two kinds of principals: end users, who log in with Basic auth, and
//! trusted internal servers, which log in with a shared secret. It also hands
//! out salted, non-reversible correlation ids ("id hash pairs") so analytics
//! can follow a user without learning who they are.
//!
//! ## Layout
//!
//! - [`token`]: the HS256 token codec with typed claims and multi-secret
//!   verification for rotation.
//! - [`auth`]: the decision engine behind login, server login, refresh,
//!   logout and the server-only gate.
//! - [`hash`]: credential hashing and correlation id derivation.
//! - [`store`]: the storage contract with in-memory and `PostgreSQL`
//!   implementations.
//! - [`api`]: the axum router and handlers.
//! - [`cli`]: argument parsing, telemetry and process bootstrap.
//!
//! ## Failure model
//!
//! Every request-path failure is a value of a closed error enum and becomes an
//! HTTP status. A storage outage turns into `500` responses for the affected
//! requests; it never stops the process.

pub mod api;
pub mod auth;
pub mod cli;
pub mod hash;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
