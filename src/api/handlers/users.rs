use axum::{
    extract::{Extension, Path},
    response::Json,
};
use std::sync::Arc;

use crate::auth::{AuthEngine, AuthError};
use crate::store::UserResponse;

#[utoipa::path(
    get,
    path = "/user/{userid}",
    params(("userid" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User record", body = UserResponse),
        (status = 401, description = "Caller is not a server"),
        (status = 404, description = "Unknown user")
    ),
    security(("server_token" = [])),
    tag = "server"
)]
pub async fn get_user(
    Path(user_id): Path<String>,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = engine.find_user(&user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

#[utoipa::path(
    delete,
    path = "/user/{userid}",
    params(("userid" = String, Path, description = "User id")),
    responses(
        (status = 401, description = "Caller is not a server"),
        (status = 501, description = "Deleting users is not supported")
    ),
    security(("server_token" = [])),
    tag = "server"
)]
pub async fn delete_user() -> AuthError {
    AuthError::NotImplemented
}
