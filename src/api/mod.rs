use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::auth::AuthEngine;

mod error;
pub mod handlers;
mod openapi;

pub use openapi::openapi;

use handlers::{health, login, private, require_server, session, users};

/// Build the application router.
///
/// Routes under `/token/:token`, `/private/:userid/:key` and `/user/:userid`
/// require a valid server token.
pub fn router(engine: Arc<AuthEngine>) -> Router {
    let server_only = Router::new()
        .route("/token/:token", get(session::server_check_token))
        .route(
            "/private/:userid/:key",
            get(private::get_pair)
                .post(private::regenerate_pair)
                .put(private::regenerate_pair)
                .delete(private::delete_pair),
        )
        .route("/user/:userid", get(users::get_user).delete(users::delete_user))
        .route_layer(middleware::from_fn(require_server));

    Router::new()
        .route("/health", get(health::health).options(health::health))
        .route("/login", post(login::login).get(session::refresh))
        .route("/login/:longtermkey", post(login::login_long_term))
        .route("/serverlogin", post(login::server_login))
        .route("/logout", post(session::logout))
        .route("/token", get(session::check_token))
        .route("/private", get(private::anonymous_pair))
        .merge(server_only)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(engine)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, engine: Arc<AuthEngine>) -> Result<()> {
    let app = router(engine);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
