//! One-time password entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the otps table.
#[derive(Debug, Clone, FromRow)]
pub struct OtpEntity {
    pub id: Uuid,
    pub mobile: String,
    pub code: String,
    pub purpose: String,
    pub consumed: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<OtpEntity> for domain::models::Otp {
    fn from(entity: OtpEntity) -> Self {
        Self {
            id: entity.id,
            mobile: entity.mobile,
            code: entity.code,
            purpose: domain::models::OtpPurpose::from_str(&entity.purpose)
                .unwrap_or(domain::models::OtpPurpose::Login), // Default fallback
            consumed: entity.consumed,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}
