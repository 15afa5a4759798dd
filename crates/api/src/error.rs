use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type covering every failure the handlers can surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Payment gateway is not configured")]
    GatewayUnavailable,

    #[error("Entitlement grant failed for transaction {transaction_id}")]
    EntitlementGrantFailed { transaction_id: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::EntitlementGrantFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::RateLimited(_) => "RATE_LIMITED",
            ApiError::GatewayUnavailable => "GATEWAY_UNAVAILABLE",
            ApiError::EntitlementGrantFailed { .. } => "ENTITLEMENT_GRANT_FAILED",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal failures are logged with detail but returned opaque.
        let message = match &self {
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                "An internal error occurred".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            ApiError::EntitlementGrantFailed { transaction_id } => {
                tracing::error!(transaction_id = %transaction_id, "Entitlement grant failed");
                format!(
                    "Settlement failed for transaction {transaction_id}; the payment was not recorded and the gateway will retry"
                )
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => ApiError::Conflict("Resource already exists".to_string()),
                // Foreign key violation
                Some("23503") => ApiError::NotFound("Referenced resource not found".to_string()),
                _ => ApiError::Database(err),
            },
            _ => ApiError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let detail = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::Validation(detail)
    }
}

impl From<domain::services::GatewayError> for ApiError {
    fn from(err: domain::services::GatewayError) -> Self {
        match err {
            domain::services::GatewayError::NotConfigured => ApiError::GatewayUnavailable,
        }
    }
}

impl From<domain::services::CollaboratorError> for ApiError {
    fn from(err: domain::services::CollaboratorError) -> Self {
        use domain::services::CollaboratorError;
        match err {
            CollaboratorError::NotFound(what) => ApiError::NotFound(what),
            CollaboratorError::Storage(msg) => ApiError::Internal(msg),
            CollaboratorError::Watermark(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<shared::jwt::JwtError> for ApiError {
    fn from(err: shared::jwt::JwtError) -> Self {
        use shared::jwt::JwtError;
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::Invalid => ApiError::Unauthorized("Invalid token".to_string()),
            JwtError::Sign => ApiError::Internal("token signing failed".to_string()),
        }
    }
}

impl From<shared::password::PasswordError> for ApiError {
    fn from(err: shared::password::PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_variants() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::GatewayUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::EntitlementGrantFailed {
                transaction_id: "TXN1".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn grant_failure_message_names_the_transaction() {
        let err = ApiError::EntitlementGrantFailed {
            transaction_id: "TXN170000000000012345".into(),
        };
        assert!(err.to_string().contains("TXN170000000000012345"));
    }
}
