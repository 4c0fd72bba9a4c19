#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use prompthub_api::auth::jwt::{generate_access_token, JwtConfig};
use prompthub_api::auth::password::hash_password;
use prompthub_api::auth::totp::{derive_key, OtpConfig};
use prompthub_api::config::ServerConfig;
use prompthub_api::router::build_app_router;
use prompthub_api::state::AppState;
use prompthub_core::roles::Role;
use prompthub_core::storage::LocalBlobStore;
use prompthub_db::models::user::{CreateUser, User};
use prompthub_db::repositories::UserRepo;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults and a fresh storage root.
pub fn test_config() -> ServerConfig {
    let jwt = JwtConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        access_token_expiry_mins: 15,
        refresh_token_expiry_days: 7,
    };
    let otp = OtpConfig {
        issuer: "PromptHub".to_string(),
        drift_secs: 60,
        encryption_key: derive_key(&jwt.secret),
    };
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt,
        otp,
        storage_root: std::env::temp_dir()
            .join(format!("prompthub-test-{}", uuid::Uuid::new_v4())),
        storage_public_path: "/files".to_string(),
        max_upload_bytes: 1024 * 1024,
        min_password_length: 8,
    }
}

/// Build the application with the production router builder.
pub async fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let blobs = LocalBlobStore::new(
        config.storage_root.clone(),
        config.storage_public_path.clone(),
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        blobs: Arc::new(blobs),
    };
    build_app_router(state, &config)
}

/// Insert a user directly and return it with a valid access token.
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> (User, String) {
    let input = CreateUser {
        email: format!("{username}@test.com"),
        username: Some(username.to_string()),
        name: Some(format!("{username} tester")),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role,
    };
    let user = UserRepo::create(pool, &input).await.unwrap();
    let token = generate_access_token(user.id, user.role, &test_config().jwt).unwrap();
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// POST a multipart body with one `file` part per `(filename, content_type, bytes)`.
pub async fn post_files_auth(
    app: Router,
    uri: &str,
    files: &[(&str, &str, &[u8])],
    token: &str,
) -> Response<Body> {
    let boundary = "prompthub-test-boundary";
    let mut body = Vec::new();
    for (filename, content_type, bytes) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
