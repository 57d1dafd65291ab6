use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::AUTHORIZATION},
    response::Response,
};
use base64ct::{Base64, Encoding};
use gatehouse::{
    api,
    auth::{AuthConfig, AuthEngine},
    hash::hash_password,
    store::{MemoryStore, Store, User},
    token::{TokenConfig, TokenData, create_token},
};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

const SALT: &str = "sea salt";
const SERVER_SECRET: &str = "server-secret";
const API_SECRET: &str = "api-secret";
const SESSION_TOKEN: &str = "x-tidepool-session-token";

fn alice() -> Result<User> {
    Ok(User {
        id: "alice-id".to_string(),
        name: "alice".to_string(),
        pw_hash: hash_password("alice-id", "secret", SALT)?,
        ..User::default()
    })
}

fn app() -> Result<(Router, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::new().with_user(alice()?));
    let config = AuthConfig::new(
        SecretString::from(SERVER_SECRET),
        SecretString::from(API_SECRET),
        SecretString::from(SALT),
    )
    .with_long_term_key(SecretString::from("long-term"))
    .with_token_config(TokenConfig::new().with_user_duration_secs(3600));
    let engine = Arc::new(AuthEngine::new(config, store.clone()));
    Ok((api::router(engine), store))
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

async fn send(app: &Router, request: Request<Body>) -> Result<Response> {
    Ok(app.clone().oneshot(request).await?)
}

async fn json(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn session_token(response: &Response) -> Result<String> {
    Ok(response
        .headers()
        .get(SESSION_TOKEN)
        .context("missing session token header")?
        .to_str()?
        .to_string())
}

fn get(uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(SESSION_TOKEN, token);
    }
    Ok(builder.body(Body::empty())?)
}

fn user_login_request(uri: &str, credentials: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            AUTHORIZATION,
            format!("Basic {}", Base64::encode_string(credentials.as_bytes())),
        )
        .body(Body::empty())?)
}

fn server_login_request(secret: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/serverlogin")
        .header("x-tidepool-server-name", "shoreline")
        .header("x-tidepool-server-secret", secret)
        .body(Body::empty())?)
}

async fn server_token(app: &Router) -> Result<String> {
    let response = send(app, server_login_request(SERVER_SECRET)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    session_token(&response)
}

#[tokio::test]
async fn login_returns_user_and_token() -> Result<()> {
    let (app, store) = app()?;

    let response = send(&app, user_login_request("/login", "alice:secret")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let token = session_token(&response)?;
    let body = json(response).await?;
    assert_eq!(body["userid"], "alice-id");
    assert_eq!(body["username"], "alice");
    assert!(body.get("pw_hash").is_none());
    assert_eq!(store.token_count().await, 1);

    let record = store.find_token(&token).await?.context("token not stored")?;
    assert!(!record.is_server);
    assert_eq!(record.duration_secs, 3600);

    let response = send(&app, get("/token", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await?;
    assert_eq!(body["isserver"], false);
    assert_eq!(body["userid"], "alice-id");
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_input() -> Result<()> {
    let (app, _store) = app()?;

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/login")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, user_login_request("/login", "alice:wrong")?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SESSION_TOKEN).is_none());
    Ok(())
}

#[tokio::test]
async fn long_term_login_gets_thirty_days() -> Result<()> {
    let (app, store) = app()?;

    let response = send(&app, user_login_request("/login/long-term", "alice:secret")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let token = session_token(&response)?;
    let record = store.find_token(&token).await?.context("token not stored")?;
    assert_eq!(record.duration_secs, 30 * 24 * 60 * 60);

    // Long sessions are not renewed; refresh only echoes the identity.
    let response = send(&app, get("/login", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SESSION_TOKEN).is_none());
    assert_eq!(json(response).await?["userid"], "alice-id");
    Ok(())
}

#[tokio::test]
async fn server_login_issues_day_long_server_token() -> Result<()> {
    let (app, store) = app()?;

    let token = server_token(&app).await?;
    let record = store.find_token(&token).await?.context("token not stored")?;
    assert!(record.is_server);
    assert_eq!(record.principal_id, "shoreline");
    assert_eq!(record.duration_secs, 86_400);
    Ok(())
}

#[tokio::test]
async fn oversized_token_duration_is_capped() -> Result<()> {
    let (app, store) = app()?;

    for requested in ["9223372036854775807", "315360000"] {
        let mut request = server_login_request(SERVER_SECRET)?;
        request
            .headers_mut()
            .insert("tokenduration", requested.parse()?);
        let response = tokio::spawn(app.clone().oneshot(request)).await??;
        assert_eq!(response.status(), StatusCode::OK);
        let token = session_token(&response)?;
        let record = store.find_token(&token).await?.context("token not stored")?;
        assert_eq!(record.duration_secs, 86_400);
        assert!(record.expires_at > record.created_at);

        let mut request = user_login_request("/login", "alice:secret")?;
        request
            .headers_mut()
            .insert("tokenduration", requested.parse()?);
        let response = tokio::spawn(app.clone().oneshot(request)).await??;
        assert_eq!(response.status(), StatusCode::OK);
        let token = session_token(&response)?;
        let record = store.find_token(&token).await?.context("token not stored")?;
        assert_eq!(record.duration_secs, 3600);
        assert!(record.expires_at > record.created_at);
    }

    let mut request = user_login_request("/login", "alice:secret")?;
    request.headers_mut().insert("tokenduration", "600".parse()?);
    let response = send(&app, request).await?;
    let record = store
        .find_token(&session_token(&response)?)
        .await?
        .context("token not stored")?;
    assert_eq!(record.duration_secs, 600);
    Ok(())
}

#[tokio::test]
async fn server_login_with_wrong_secret_is_unauthorized() -> Result<()> {
    let (app, store) = app()?;

    let response = send(&app, server_login_request("guess")?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SESSION_TOKEN).is_none());
    assert_eq!(store.operations(), 0);
    Ok(())
}

#[tokio::test]
async fn logout_without_token_is_ok_and_touches_nothing() -> Result<()> {
    let (app, store) = app()?;

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/logout")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.operations(), 0);
    Ok(())
}

#[tokio::test]
async fn logout_revokes_refresh() -> Result<()> {
    let (app, _store) = app()?;
    let token = server_token(&app).await?;

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/logout")
            .header(SESSION_TOKEN, &token)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/login", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_renews_server_token() -> Result<()> {
    let (app, store) = app()?;
    let token = server_token(&app).await?;

    let response = send(&app, get("/login", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = session_token(&response)?;
    assert_eq!(json(response).await?["isserver"], true);
    assert!(store.find_token(&renewed).await?.is_some());
    // The previous token stays valid until it expires.
    assert!(store.find_token(&token).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_expired_token() -> Result<()> {
    let (app, store) = app()?;
    let expired = create_token(
        &TokenData::user("alice-id", 60),
        API_SECRET.as_bytes(),
        &TokenConfig::new(),
        now() - 3600,
    )?;
    store.add_token(&expired).await?;

    let response = send(&app, get("/login", Some(&expired.token))?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn server_routes_reject_user_tokens() -> Result<()> {
    let (app, _store) = app()?;

    let response = send(&app, user_login_request("/login", "alice:secret")?).await?;
    let user_token = session_token(&response)?;

    for uri in ["/user/alice-id", "/private/alice-id/analytics", "/token/abc"] {
        let response = send(&app, get(uri, Some(&user_token))?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let response = send(&app, get(uri, None)?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn server_routes_accept_server_tokens() -> Result<()> {
    let (app, _store) = app()?;
    let token = server_token(&app).await?;

    let response = send(&app, get("/user/alice-id", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await?["username"], "alice");

    let response = send(&app, get("/user/nobody", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/token/{token}"), Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await?["userid"], "shoreline");

    let response = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/user/alice-id")
            .header(SESSION_TOKEN, &token)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    Ok(())
}

#[tokio::test]
async fn id_hash_pairs() -> Result<()> {
    let (app, _store) = app()?;
    let token = server_token(&app).await?;

    let response = send(&app, get("/private/alice-id/analytics", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let first = json(response).await?;
    assert_eq!(first["id"].as_str().map(str::len), Some(10));
    assert_eq!(first["hash"].as_str().map(str::len), Some(24));

    let response = send(&app, get("/private/alice-id/analytics", Some(&token))?).await?;
    assert_eq!(json(response).await?, first);

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/private/alice-id/analytics")
            .header(SESSION_TOKEN, &token)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_ne!(json(response).await?, first);

    let response = send(&app, get("/private/nobody/analytics", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn anonymous_pair_needs_query_params() -> Result<()> {
    let (app, _store) = app()?;

    let response = send(&app, get("/private", None)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, get("/private?study=sleep&site=7", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let pair = json(response).await?;
    assert_eq!(pair["id"].as_str().map(str::len), Some(10));
    Ok(())
}

#[tokio::test]
async fn storage_outage_is_a_server_error() -> Result<()> {
    let (app, store) = app()?;
    store.set_failing(true);

    let response = send(&app, user_login_request("/login", "alice:secret")?).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = send(&app, get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    store.set_failing(false);
    let response = send(&app, get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("X-App").is_some());
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(json(response).await?["store"], "ok");
    Ok(())
}
