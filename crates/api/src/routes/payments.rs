use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use domain::models::{GatewayCallback, InitiatePaymentRequest};
use shared::pagination::Pagination;

async fn initiate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .payment_service()
        .initiate(user.user_id, payload.course_id)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Gateway webhook. Carries no bearer token; trust comes from the
/// response signature, which is verified before any state change.
async fn callback(
    State(state): State<AppState>,
    Form(payload): Form<GatewayCallback>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.payment_service().handle_callback(&payload).await?;
    Ok(Json(outcome))
}

async fn status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state
        .payment_service()
        .get_status(&transaction_id, &user)
        .await?;
    Ok(Json(txn))
}

async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .payment_service()
        .history(user.user_id, pagination)
        .await?;
    Ok(Json(page))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/payments/callback", post(callback))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/initiate", post(initiate))
        .route("/payments/status/:transaction_id", get(status))
        .route("/payments/history", get(history))
}
