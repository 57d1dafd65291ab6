//! User and server login.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, header::AUTHORIZATION},
    response::Json,
};
use std::sync::Arc;

use super::{
    SERVER_NAME_HEADER, SERVER_SECRET_HEADER, header_str, requested_duration,
    session_token_headers,
};
use crate::auth::{AuthEngine, AuthError};
use crate::store::UserResponse;

#[utoipa::path(
    post,
    path = "/login",
    responses(
        (status = 200, description = "Logged in", body = UserResponse,
            headers(("x-tidepool-session-token" = String, description = "New session token"))),
        (status = 400, description = "Missing or malformed credentials"),
        (status = 401, description = "Unknown user or wrong password"),
        (status = 500, description = "Token store failure")
    ),
    security(("basic_auth" = [])),
    tag = "session"
)]
pub async fn login(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<(HeaderMap, Json<UserResponse>), AuthError> {
    user_login(&engine, &headers, None).await
}

#[utoipa::path(
    post,
    path = "/login/{longtermkey}",
    params(("longtermkey" = String, Path, description = "Long-term key granting a 30 day session")),
    responses(
        (status = 200, description = "Logged in", body = UserResponse,
            headers(("x-tidepool-session-token" = String, description = "New session token"))),
        (status = 400, description = "Missing or malformed credentials"),
        (status = 401, description = "Unknown user or wrong password"),
        (status = 500, description = "Token store failure")
    ),
    security(("basic_auth" = [])),
    tag = "session"
)]
pub async fn login_long_term(
    Path(long_term_key): Path<String>,
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<(HeaderMap, Json<UserResponse>), AuthError> {
    user_login(&engine, &headers, Some(&long_term_key)).await
}

async fn user_login(
    engine: &AuthEngine,
    headers: &HeaderMap,
    long_term_key: Option<&str>,
) -> Result<(HeaderMap, Json<UserResponse>), AuthError> {
    let (session, user) = engine
        .login(
            header_str(headers, AUTHORIZATION.as_str()),
            requested_duration(headers),
            long_term_key,
        )
        .await?;
    let response_headers = session_token_headers(&session.token)?;
    Ok((response_headers, Json(UserResponse::from(&user))))
}

#[utoipa::path(
    post,
    path = "/serverlogin",
    params(
        ("x-tidepool-server-name" = String, Header, description = "Server principal name"),
        ("x-tidepool-server-secret" = String, Header, description = "Shared server secret")
    ),
    responses(
        (status = 200, description = "Logged in",
            headers(("x-tidepool-session-token" = String, description = "New server token"))),
        (status = 400, description = "Missing server name or secret"),
        (status = 401, description = "Wrong server secret"),
        (status = 500, description = "Token store failure")
    ),
    tag = "session"
)]
pub async fn server_login(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<HeaderMap, AuthError> {
    let session = engine
        .server_login(
            header_str(&headers, SERVER_NAME_HEADER).unwrap_or_default(),
            header_str(&headers, SERVER_SECRET_HEADER).unwrap_or_default(),
            requested_duration(&headers),
        )
        .await?;
    session_token_headers(&session.token)
}
