//! Payment transaction entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the payment_transactions table.
/// `idempotency_key` carries a UNIQUE constraint; duplicate-key inserts
/// surface as 23505 and are handled by the payment service.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentTransactionEntity {
    pub id: Uuid,
    pub transaction_id: String,
    pub idempotency_key: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub product_info: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_mobile: String,
    pub gateway_payment_id: Option<String>,
    pub gateway_txn_id: Option<String>,
    pub hash: Option<String>,
    pub response_hash: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PaymentTransactionEntity> for domain::models::PaymentTransaction {
    fn from(entity: PaymentTransactionEntity) -> Self {
        Self {
            id: entity.id,
            transaction_id: entity.transaction_id,
            idempotency_key: entity.idempotency_key,
            user_id: entity.user_id,
            course_id: entity.course_id,
            amount: entity.amount,
            status: domain::models::TransactionStatus::from_str(&entity.status)
                .unwrap_or(domain::models::TransactionStatus::Failed), // Fail closed
            gateway_payment_id: entity.gateway_payment_id,
            gateway_txn_id: entity.gateway_txn_id,
            hash: entity.hash,
            response_hash: entity.response_hash,
            error_code: entity.error_code,
            error_message: entity.error_message,
            initiated_at: entity.initiated_at,
            completed_at: entity.completed_at,
        }
    }
}
