//! Entitlement entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the user_courses table. Insert-only; rows
/// are written inside the payment success transaction.
#[derive(Debug, Clone, FromRow)]
pub struct EntitlementEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub gateway_payment_id: Option<String>,
    pub status: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub granted_at: DateTime<Utc>,
}

impl From<EntitlementEntity> for domain::models::Entitlement {
    fn from(entity: EntitlementEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            course_id: entity.course_id,
            amount: entity.amount,
            gateway_payment_id: entity.gateway_payment_id,
            expiry_date: entity.expiry_date,
            granted_at: entity.granted_at,
        }
    }
}
