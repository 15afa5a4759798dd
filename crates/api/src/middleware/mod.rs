pub mod auth;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod trace_id;

pub use auth::{require_admin, require_auth};
pub use logging::init_logging;
pub use metrics::{init_metrics, metrics_handler, track_metrics};
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
pub use security_headers::security_headers;
pub use trace_id::trace_id_middleware;
