//! Credential and correlation-id hashing.
//!
//! `password` produces the deterministic credential hash stored on a user
//! record. `anonymize` produces randomized correlation identifiers that can be
//! handed to analytics without exposing the user's real id.

pub mod anonymize;
pub mod password;

pub use anonymize::{IdHashPair, derive_hash};
pub use password::hash_password;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("failed to read random bytes")]
    Random(#[from] rand::Error),
}
