//! Route handlers and the header contract they share.
//!
//! Session tokens travel in `x-tidepool-session-token` in both directions.
//! Servers authenticate with `x-tidepool-server-name` and
//! `x-tidepool-server-secret`; callers may ask for a lifetime with
//! `tokenduration` (seconds).

pub mod health;
pub mod login;
pub mod private;
pub mod session;
pub mod users;

use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::auth::{AuthEngine, AuthError};
use crate::token::TokenData;

pub const SESSION_TOKEN_HEADER: &str = "x-tidepool-session-token";
pub const SERVER_NAME_HEADER: &str = "x-tidepool-server-name";
pub const SERVER_SECRET_HEADER: &str = "x-tidepool-server-secret";
pub const TOKEN_DURATION_HEADER: &str = "tokenduration";

/// Header value as text; absent, non-ASCII or empty values read as `None`.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Requested token lifetime; anything unparsable or non-positive means default.
pub(crate) fn requested_duration(headers: &HeaderMap) -> i64 {
    header_str(headers, TOKEN_DURATION_HEADER)
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|seconds| *seconds > 0)
        .unwrap_or(0)
}

/// Response headers carrying a freshly issued token.
pub(crate) fn session_token_headers(token: &str) -> Result<HeaderMap, AuthError> {
    let value = HeaderValue::from_str(token).map_err(|err| {
        error!("Failed to encode session token header: {err}");
        AuthError::Token(crate::token::Error::HeaderValue)
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(SESSION_TOKEN_HEADER, value);
    Ok(headers)
}

/// Gate for privileged routes; the verified claims are handed to the handler
/// as a request extension.
pub async fn require_server(
    engine: Extension<Arc<AuthEngine>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = header_str(request.headers(), SESSION_TOKEN_HEADER);
    match engine.require_server_token(token) {
        Ok(data) => {
            request.extensions_mut().insert::<TokenData>(data);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_duration_ignores_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(requested_duration(&headers), 0);

        headers.insert(TOKEN_DURATION_HEADER, HeaderValue::from_static("600"));
        assert_eq!(requested_duration(&headers), 600);

        headers.insert(TOKEN_DURATION_HEADER, HeaderValue::from_static("-5"));
        assert_eq!(requested_duration(&headers), 0);

        headers.insert(TOKEN_DURATION_HEADER, HeaderValue::from_static("soon"));
        assert_eq!(requested_duration(&headers), 0);
    }

    #[test]
    fn session_token_headers_rejects_unencodable_tokens() {
        let result = session_token_headers("line\nbreak");
        assert!(matches!(
            result,
            Err(AuthError::Token(crate::token::Error::HeaderValue))
        ));

        let headers = session_token_headers("abc.def.ghi");
        assert!(matches!(
            headers.as_ref().map(|headers| headers.get(SESSION_TOKEN_HEADER)),
            Ok(Some(value)) if value == "abc.def.ghi"
        ));
    }

    #[test]
    fn header_str_treats_blank_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_TOKEN_HEADER, HeaderValue::from_static("  "));
        assert_eq!(header_str(&headers, SESSION_TOKEN_HEADER), None);

        headers.insert(SESSION_TOKEN_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(header_str(&headers, SESSION_TOKEN_HEADER), Some("abc"));
    }
}
