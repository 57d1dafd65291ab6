use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::auth::AuthError;

impl AuthError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Storage(_) | Self::Hash(_) | Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Unauthorized responses never say which check failed.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::BadRequest(reason) | Self::NotFound(reason) => (status, *reason).into_response(),
            Self::Storage(err) => {
                error!("Storage failure: {err}");
                status.into_response()
            }
            Self::Hash(err) => {
                error!("Hashing failure: {err}");
                status.into_response()
            }
            Self::Token(err) => {
                error!("Token issuance failure: {err}");
                status.into_response()
            }
            Self::Unauthorized(_) | Self::NotImplemented => status.into_response(),
        }
    }
}
