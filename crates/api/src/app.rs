use crate::config::Config;
use crate::middleware::{
    metrics_handler, rate_limit_middleware, require_admin, require_auth, security_headers,
    trace_id_middleware, track_metrics, RateLimiterState,
};
use crate::routes;
use crate::services::{
    AuthService, ConsoleOtpSender, ContentService, LocalBlobStore, PaymentService, TextStamper,
};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use domain::services::{BlobStore, GatewayAdapter, OtpSender, Watermarker};
use shared::jwt::JwtSigner;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtSigner>,
    pub gateway: Arc<GatewayAdapter>,
    pub blob_store: Arc<dyn BlobStore>,
    pub otp_sender: Arc<dyn OtpSender>,
    pub watermarker: Arc<dyn Watermarker>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// State with the default collaborators: local filesystem storage,
    /// log-based OTP delivery and the comment watermarker.
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        let jwt = Arc::new(JwtSigner::new(
            &config.jwt.secret,
            config.jwt.token_expiry_days,
        ));
        let gateway = Arc::new(GatewayAdapter::new(config.gateway_config()));
        let blob_store: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(config.storage.root_dir.clone()));
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Self {
            pool,
            config,
            jwt,
            gateway,
            blob_store,
            otp_sender: Arc::new(ConsoleOtpSender),
            watermarker: Arc::new(TextStamper),
            rate_limiter,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.pool.clone(),
            self.jwt.clone(),
            self.otp_sender.clone(),
            self.config.jwt.token_expiry_days,
        )
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(self.pool.clone(), self.gateway.clone())
    }

    pub fn content_service(&self) -> ContentService {
        ContentService::new(
            self.pool.clone(),
            self.blob_store.clone(),
            self.watermarker.clone(),
        )
    }
}

pub fn create_app(pool: PgPool, config: Arc<Config>) -> Router {
    build_router(AppState::new(pool, config))
}

/// Assembles the router around prepared state. Tests use this to swap
/// collaborators.
pub fn build_router(state: AppState) -> Router {
    let public_api = routes::auth::public_routes()
        .merge(routes::categories::public_routes())
        .merge(routes::courses::public_routes())
        .merge(routes::payments::public_routes());

    let protected_api = routes::auth::protected_routes()
        .merge(routes::courses::protected_routes())
        .merge(routes::content::protected_routes())
        .merge(routes::payments::protected_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_api = routes::categories::admin_routes()
        .merge(routes::courses::admin_routes())
        .merge(routes::content::admin_routes())
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = public_api.merge(protected_api).merge(admin_api);

    Router::new()
        .merge(routes::health::routes())
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.security.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
    }
}
