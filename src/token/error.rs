use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("token principal is not set")]
    MissingPrincipal,
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    InvalidKey,
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
    #[error("token cannot be sent as a header value")]
    HeaderValue,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
}
