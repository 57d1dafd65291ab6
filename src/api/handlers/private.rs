//! Anonymous correlation id hash pairs.

use axum::{
    extract::{Extension, Path, RawQuery},
    http::StatusCode,
    response::Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::{AuthEngine, AuthError};
use crate::hash::IdHashPair;

/// Decode the raw query into sorted `key => value` seeds; a repeated key keeps
/// its last value.
fn query_params(query: Option<String>) -> BTreeMap<String, String> {
    query
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .filter(|(key, _)| !key.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[utoipa::path(
    get,
    path = "/private",
    responses(
        (status = 200, description = "Freshly derived pair, seeded with every query parameter", body = IdHashPair),
        (status = 400, description = "No query parameters")
    ),
    tag = "private"
)]
pub async fn anonymous_pair(
    RawQuery(query): RawQuery,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<Json<IdHashPair>, AuthError> {
    Ok(Json(engine.anonymous_id_hash_pair(&query_params(query))?))
}

#[utoipa::path(
    get,
    path = "/private/{userid}/{key}",
    params(
        ("userid" = String, Path, description = "User id"),
        ("key" = String, Path, description = "Caller chosen purpose key")
    ),
    responses(
        (status = 200, description = "Existing or newly created pair", body = IdHashPair),
        (status = 401, description = "Caller is not a server"),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "User store failure")
    ),
    security(("server_token" = [])),
    tag = "private"
)]
pub async fn get_pair(
    Path((user_id, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<Json<IdHashPair>, AuthError> {
    let pair = engine
        .get_or_create_id_hash_pair(&user_id, &key, &query_params(query))
        .await?;
    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/private/{userid}/{key}",
    params(
        ("userid" = String, Path, description = "User id"),
        ("key" = String, Path, description = "Caller chosen purpose key")
    ),
    responses(
        (status = 201, description = "Pair regenerated", body = IdHashPair),
        (status = 401, description = "Caller is not a server"),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "User store failure")
    ),
    security(("server_token" = [])),
    tag = "private"
)]
pub async fn regenerate_pair(
    Path((user_id, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    engine: Extension<Arc<AuthEngine>>,
) -> Result<(StatusCode, Json<IdHashPair>), AuthError> {
    let pair = engine
        .regenerate_id_hash_pair(&user_id, &key, &query_params(query))
        .await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

#[utoipa::path(
    delete,
    path = "/private/{userid}/{key}",
    params(
        ("userid" = String, Path, description = "User id"),
        ("key" = String, Path, description = "Caller chosen purpose key")
    ),
    responses(
        (status = 401, description = "Caller is not a server"),
        (status = 501, description = "Deleting pairs is not supported")
    ),
    security(("server_token" = [])),
    tag = "private"
)]
pub async fn delete_pair() -> AuthError {
    AuthError::NotImplemented
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_are_decoded_and_sorted() {
        let params = query_params(Some("b=2&a=hello%20world&b=3&=skip".to_string()));
        assert_eq!(
            params.into_iter().collect::<Vec<_>>(),
            vec![
                ("a".to_string(), "hello world".to_string()),
                ("b".to_string(), "3".to_string()),
            ]
        );
        assert!(query_params(None).is_empty());
        assert!(query_params(Some(String::new())).is_empty());
    }
}
