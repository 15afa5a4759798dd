use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain::models::{
    LoginRequest, OtpPurpose, RegisterRequest, ResetPasswordRequest, SendOtpRequest,
    UpdateProfileRequest, VerifyOtpRequest,
};
use serde_json::json;
use validator::Validate;

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let user = state.auth_service().register(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    state
        .auth_service()
        .send_otp(&payload.mobile, OtpPurpose::Login)
        .await?;
    Ok(Json(json!({ "message": "Code sent if the number is valid" })))
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let response = state
        .auth_service()
        .verify_otp(&payload.mobile, &payload.code)
        .await?;
    Ok(Json(response))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let response = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(response))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    state
        .auth_service()
        .send_otp(&payload.mobile, OtpPurpose::PasswordReset)
        .await?;
    Ok(Json(json!({ "message": "Code sent if the number is valid" })))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    state
        .auth_service()
        .reset_password(&payload.mobile, &payload.code, &payload.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password updated if the account exists" })))
}

async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.auth_service().logout(user.user_id).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.auth_service().profile(user.user_id).await?;
    Ok(Json(profile))
}

async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let profile = state
        .auth_service()
        .update_profile(user.user_id, &payload)
        .await?;
    Ok(Json(profile))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/otp/send", post(send_otp))
        .route("/auth/otp/verify", post(verify_otp))
        .route("/auth/login", post(login))
        .route("/auth/password/forgot", post(forgot_password))
        .route("/auth/password/reset", post(reset_password))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me).put(update_me))
}
