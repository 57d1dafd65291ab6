use thiserror::Error;

use crate::{hash, store::StoreError, token};

/// Request-scoped failures of the auth flows.
///
/// Verification failures are folded into `Unauthorized` or `NotFound` by the
/// engine; `Token` only carries issuance errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("not implemented")]
    NotImplemented,
    #[error("storage failure")]
    Storage(#[from] StoreError),
    #[error("hashing failure")]
    Hash(#[from] hash::Error),
    #[error("token issuance failure")]
    Token(#[from] token::Error),
}
