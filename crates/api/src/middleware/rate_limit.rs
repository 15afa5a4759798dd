use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-user token-bucket limiters, created lazily on first request.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<Uuid, Arc<DefaultDirectRateLimiter>>>,
    quota: Quota,
}

impl RateLimiterState {
    /// Returns None when `per_minute` is zero (rate limiting disabled).
    pub fn new(per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(per_minute)?;
        Some(Self {
            limiters: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(per_minute),
        })
    }

    pub async fn check(&self, key: Uuid) -> bool {
        {
            let limiters = self.limiters.read().await;
            if let Some(limiter) = limiters.get(&key) {
                return limiter.check().is_ok();
            }
        }

        let mut limiters = self.limiters.write().await;
        let limiter = limiters
            .entry(key)
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)));
        limiter.check().is_ok()
    }
}

/// Enforces the per-user request budget on authenticated routes.
/// Must run after `require_auth` so the user extension is present.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(rate_limiter) = &state.rate_limiter {
        if let Some(user) = request.extensions().get::<AuthUser>() {
            if !rate_limiter.check(user.user_id).await {
                metrics::counter!("rate_limit_rejections_total").increment(1);
                return Err(ApiError::RateLimited(
                    "Too many requests, slow down".to_string(),
                ));
            }
        }
    }

    Ok(next.run(request).await)
}
