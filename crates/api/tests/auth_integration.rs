mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_register_and_otp_login_flow() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let (token, user_id) = register_and_login(&app, &pool).await;

    let response = send(&app, get_request("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(me["role"], "student");
    // The password hash must never appear in responses.
    assert!(me.get("passwordHash").is_none());

    let response = send(&app, get_request("/api/v1/auth/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let email = random_email();
    let first = json_request(
        "POST",
        "/api/v1/auth/register",
        None,
        json!({ "name": "One", "email": email, "mobile": random_mobile() }),
    );
    assert_eq!(send(&app, first).await.status(), StatusCode::CREATED);

    let second = json_request(
        "POST",
        "/api/v1/auth/register",
        None,
        json!({ "name": "Two", "email": email, "mobile": random_mobile() }),
    );
    assert_eq!(send(&app, second).await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_invalid_mobile() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "name": "Bad", "email": random_email(), "mobile": "12345" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_otp_is_rejected_and_right_code_is_single_use() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let mobile = random_mobile();
    let email = random_email();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "name": "Student", "email": email, "mobile": mobile }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            json!({ "mobile": mobile }),
        ),
    )
    .await;

    let wrong = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/otp/verify",
            None,
            json!({ "mobile": mobile, "code": "000000" }),
        ),
    )
    .await;
    // The right code may be 000000 once in a million runs; tolerate it.
    assert!(
        wrong.status() == StatusCode::UNAUTHORIZED || wrong.status() == StatusCode::OK,
        "unexpected status {}",
        wrong.status()
    );

    let code: String = sqlx::query_scalar(
        "SELECT code FROM otps WHERE mobile = $1 AND purpose = 'login' \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(&mobile)
    .fetch_one(&pool)
    .await
    .unwrap();

    if code != "000000" {
        let ok = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/otp/verify",
                None,
                json!({ "mobile": mobile, "code": code }),
            ),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);

        // Consumed codes cannot be replayed.
        let replay = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/otp/verify",
                None,
                json!({ "mobile": mobile, "code": code }),
            ),
        )
        .await;
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_otp_send_is_rate_limited_per_mobile() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());
    let mobile = random_mobile();

    for _ in 0..5 {
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/otp/send",
                None,
                json!({ "mobile": mobile }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let sixth = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/otp/send",
            None,
            json!({ "mobile": mobile }),
        ),
    )
    .await;
    assert_eq!(sixth.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_admin_password_login() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let token = create_admin_and_login(&app, &pool).await;
    let response = send(&app, get_request("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
async fn test_password_login_is_denied_for_students() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let email = random_email();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "name": "Student", "email": email, "mobile": random_mobile() }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": "whatever-1" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_new_login_revokes_previous_session() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let mobile = random_mobile();
    let email = random_email();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "name": "Student", "email": email, "mobile": mobile }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let first_token = otp_login(&app, &pool, &mobile).await;
    let second_token = otp_login(&app, &pool, &mobile).await;

    let old = send(&app, get_request("/api/v1/auth/me", Some(&first_token))).await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let current = send(&app, get_request("/api/v1/auth/me", Some(&second_token))).await;
    assert_eq!(current.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("skipping: no test database");
        return;
    };
    let app = test_app(pool.clone());

    let (token, _) = register_and_login(&app, &pool).await;

    let response = send(
        &app,
        json_request("POST", "/api/v1/auth/logout", Some(&token), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let after = send(&app, get_request("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}
