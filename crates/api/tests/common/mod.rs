#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use gatehouse_api::auth::jwt::{JwtConfig, TokenIssuer};
use gatehouse_api::auth::password::PasswordHasher;
use gatehouse_api::auth::service::SessionPolicy;
use gatehouse_api::auth::AuthService;
use gatehouse_api::config::{LogFormat, ServerConfig, StorageConfig};
use gatehouse_api::router::build_app_router;
use gatehouse_api::state::AppState;
use gatehouse_db::{MemoryStore, SessionStore, UserStore};

pub const TEST_SECRET: &str = "integration-test-secret-with-enough-length";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        storage: StorageConfig::Memory,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        session_expiry_hours: 24,
        revoke_sessions_on_password_change: false,
        session_purge_interval_secs: 0,
        log_format: LogFormat::Pretty,
    }
}

/// Low-cost Argon2 parameters keep the suite fast.
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::with_params(argon2::Params::new(1024, 1, 1, None).unwrap())
}

/// A service over a fresh in-memory store, plus that store for direct
/// inspection and fixture setup.
pub fn test_service_with(policy: SessionPolicy) -> (Arc<AuthService>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store.clone(), store.clone(), policy);
    (service, store)
}

/// A service over caller-supplied stores with test hashing and tokens.
pub fn service_over(
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    policy: SessionPolicy,
) -> Arc<AuthService> {
    let config = test_config();
    Arc::new(AuthService::new(
        users,
        sessions,
        test_hasher(),
        TokenIssuer::new(&config.jwt),
        policy,
    ))
}

pub fn test_service() -> (Arc<AuthService>, Arc<MemoryStore>) {
    test_service_with(SessionPolicy::default())
}

/// Build the full application router with all middleware layers over a
/// fresh in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with_store().0
}

/// Like [`build_test_app`], also returning the backing store.
pub fn build_test_app_with_store() -> (Router, Arc<MemoryStore>) {
    let (auth, store) = test_service();
    let config = test_config();
    let app = build_app_router(AppState { auth }, &config).unwrap();
    (app, store)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::POST, uri, Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

pub async fn send_raw(app: Router, request: Request<Body>) -> Response<Body> {
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
