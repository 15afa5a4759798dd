//! Shared harness for integration tests.
//!
//! Tests run against a real Postgres instance named by
//! `TEST_DATABASE_URL`. When the variable is unset or the database is
//! unreachable the tests skip instead of failing, so the unit suite
//! stays green on machines without Postgres.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use coursemart_api::app::{build_router, AppState};
use coursemart_api::config::Config;
use http_body_util::BodyExt;
use rand::Rng;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_MERCHANT_KEY: &str = "testkey";
pub const TEST_MERCHANT_SALT: &str = "testsalt";

/// Connects to the test database, running migrations on first use.
/// Returns `None` when no test database is available.
pub async fn try_test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await
        .ok()?;
    Some(pool)
}

pub fn test_config() -> Arc<Config> {
    Arc::new(Config::load_for_test(&[]).expect("test config must parse"))
}

pub fn test_app(pool: PgPool) -> Router {
    build_router(AppState::new(pool, test_config()))
}

/// App with the payment gateway left unconfigured.
pub fn test_app_without_gateway(pool: PgPool) -> Router {
    let config =
        Arc::new(Config::load_for_test(&[("gateway.enabled", "false")]).expect("test config"));
    build_router(AppState::new(pool, config))
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request must build")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request must build")
}

pub fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request must build")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone()
        .oneshot(request)
        .await
        .expect("request must not error")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body must collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body must be JSON")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body must collect")
        .to_bytes()
        .to_vec()
}

/// A mobile number that passes validation: ten digits, leading 9.
pub fn random_mobile() -> String {
    let mut rng = rand::thread_rng();
    format!("9{:09}", rng.gen_range(0..1_000_000_000u64))
}

pub fn random_email() -> String {
    format!("user-{}@test.example", Uuid::new_v4().simple())
}

/// Registers a student via the API and logs in through the OTP flow.
/// Returns (token, user_id).
pub async fn register_and_login(app: &Router, pool: &PgPool) -> (String, Uuid) {
    let mobile = random_mobile();
    let email = random_email();

    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            serde_json::json!({ "name": "Test Student", "email": email, "mobile": mobile }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = body_json(response).await;
    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();

    let token = otp_login(app, pool, &mobile).await;
    (token, user_id)
}

/// Runs the OTP send/verify flow, reading the issued code from the
/// database as the SMS channel stand-in.
pub async fn otp_login(app: &Router, pool: &PgPool, mobile: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            serde_json::json!({ "mobile": mobile }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let code: String = sqlx::query_scalar(
        "SELECT code FROM otps WHERE mobile = $1 AND purpose = 'login' \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(mobile)
    .fetch_one(pool)
    .await
    .expect("issued OTP must exist");

    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/auth/otp/verify",
            None,
            serde_json::json!({ "mobile": mobile, "code": code }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

/// Inserts an admin account directly and logs in with the password.
pub async fn create_admin_and_login(app: &Router, pool: &PgPool) -> String {
    let email = random_email();
    let mobile = random_mobile();
    let password = "Admin-pass-1";
    let hash = shared::password::hash_password(password).expect("hash must succeed");

    sqlx::query(
        "INSERT INTO users (name, email, mobile, role, password_hash, is_active) \
         VALUES ($1, $2, $3, 'admin', $4, true)",
    )
    .bind("Test Admin")
    .bind(&email)
    .bind(&mobile)
    .bind(&hash)
    .execute(pool)
    .await
    .expect("admin insert must succeed");

    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

/// Creates an active course through the admin API. Returns its id.
pub async fn create_course(
    app: &Router,
    admin_token: &str,
    price: &str,
    discount_percent: &str,
    expiry_days: Option<i32>,
) -> Uuid {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/courses",
            Some(admin_token),
            serde_json::json!({
                "title": format!("Course {}", Uuid::new_v4().simple()),
                "description": "Integration test course",
                "price": price,
                "discountPercent": discount_percent,
                "expiryDays": expiry_days,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}
