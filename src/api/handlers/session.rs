//! Refresh, logout and token checks.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{SESSION_TOKEN_HEADER, header_str, session_token_headers};
use crate::auth::{AuthEngine, AuthError, RefreshOutcome};
use crate::token::TokenData;

#[utoipa::path(
    get,
    path = "/login",
    params(("x-tidepool-session-token" = String, Header, description = "Current session token")),
    responses(
        (status = 200, description = "Renewed, or identity of a non-renewable token", body = TokenData,
            headers(("x-tidepool-session-token" = String, description = "Replacement token, when renewed"))),
        (status = 401, description = "Missing, invalid, expired or revoked token"),
        (status = 500, description = "Token store failure")
    ),
    tag = "session"
)]
pub async fn refresh(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<Response, AuthError> {
    match engine
        .refresh(header_str(&headers, SESSION_TOKEN_HEADER))
        .await?
    {
        RefreshOutcome::Renewed(session) => {
            let response_headers = session_token_headers(&session.token)?;
            Ok((response_headers, Json(session.data())).into_response())
        }
        RefreshOutcome::NonRenewable(data) => Ok(Json(data).into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session token revoked, if one was presented")
    ),
    tag = "session"
)]
pub async fn logout(headers: HeaderMap, engine: Extension<Arc<AuthEngine>>) -> StatusCode {
    engine
        .logout(header_str(&headers, SESSION_TOKEN_HEADER))
        .await;
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/token",
    params(("x-tidepool-session-token" = String, Header, description = "Token to check")),
    responses(
        (status = 200, description = "Token is live", body = TokenData),
        (status = 404, description = "Token is invalid, expired or revoked")
    ),
    tag = "session"
)]
pub async fn check_token(
    headers: HeaderMap,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<Json<TokenData>, AuthError> {
    let data = engine
        .server_check_token(header_str(&headers, SESSION_TOKEN_HEADER))
        .await?;
    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/token/{token}",
    params(("token" = String, Path, description = "Token to check")),
    responses(
        (status = 200, description = "Token is live", body = TokenData),
        (status = 401, description = "Caller is not a server"),
        (status = 404, description = "Token is invalid, expired or revoked")
    ),
    security(("server_token" = [])),
    tag = "server"
)]
pub async fn server_check_token(
    Path(token): Path<String>,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<Json<TokenData>, AuthError> {
    let data = engine.server_check_token(Some(&token)).await?;
    Ok(Json(data))
}
