use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use domain::models::UserRole;
use persistence::repositories::UserRepository;
use shared::crypto::sha256_hex;
use std::str::FromStr;

fn bearer_token(request: &Request) -> Result<&str, ApiError> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))
}

/// Validates the bearer token and attaches [`AuthUser`] to the request.
///
/// Students hold one session at a time: a token is only accepted while
/// its hash matches the stored session row, so logging in on a new
/// device revokes the token issued to the previous one. Admin tokens
/// are checked against the JWT alone and may be used from several
/// devices at once.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)?;
    let claims = state.jwt.verify(token)?;

    let role = UserRole::from_str(&claims.role)
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    if role != UserRole::Admin {
        let users = UserRepository::new(state.pool.clone());
        let session = users
            .find_session(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Session revoked".to_string()))?;

        if session.token_hash != sha256_hex(token) {
            return Err(ApiError::Unauthorized("Session revoked".to_string()));
        }
        if session.expires_at <= Utc::now() {
            return Err(ApiError::Unauthorized("Session expired".to_string()));
        }
    }

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        role,
    });

    Ok(next.run(request).await)
}

/// Restricts a route group to admins. Runs after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.role == UserRole::Admin => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Forbidden("Admin access required".to_string())),
        None => Err(ApiError::Unauthorized("Authentication required".to_string())),
    }
}
