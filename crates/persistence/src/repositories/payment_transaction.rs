//! Payment transaction repository.
//!
//! Owns the storage side of the transaction state machine. The
//! idempotency key is enforced with a partial unique index covering
//! live and successful rows, so the concurrent double-initiate race is
//! closed here rather than by an application-level check-then-insert
//! while a terminally failed attempt never blocks a retry. The success
//! path runs a single
//! database transaction holding a row lock, so two concurrent callbacks
//! cannot both grant entitlement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EntitlementEntity, PaymentTransactionEntity};
use crate::metrics::QueryTimer;
use crate::repositories::entitlement::{insert_grant, EntitlementGrant};

const TXN_COLUMNS: &str = "id, transaction_id, idempotency_key, user_id, course_id, amount, \
                           status, product_info, customer_name, customer_email, customer_mobile, \
                           gateway_payment_id, gateway_txn_id, hash, response_hash, \
                           error_code, error_message, initiated_at, completed_at";

/// Fields for a freshly initiated transaction row. The product and
/// customer fields are the exact values the outbound hash was signed
/// over; replays are served from them rather than from live data.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub idempotency_key: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub product_info: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_mobile: String,
    pub hash: String,
}

/// Gateway response fields recorded when a transaction reaches a
/// terminal state.
#[derive(Debug, Clone, Default)]
pub struct CallbackUpdate {
    pub gateway_payment_id: Option<String>,
    pub gateway_txn_id: Option<String>,
    pub response_hash: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct PaymentTransactionRepository {
    pool: PgPool,
}

impl PaymentTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new transaction with status `initiated`. A duplicate
    /// idempotency key surfaces as a unique violation; the caller
    /// re-reads the existing row instead of treating it as an error.
    pub async fn create(
        &self,
        new: &NewTransaction,
    ) -> Result<PaymentTransactionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_payment_transaction");
        let result = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            INSERT INTO payment_transactions
                (transaction_id, idempotency_key, user_id, course_id, amount, status,
                 product_info, customer_name, customer_email, customer_mobile, hash)
            VALUES ($1, $2, $3, $4, $5, 'initiated', $6, $7, $8, $9, $10)
            RETURNING {TXN_COLUMNS}
            "#,
        ))
        .bind(&new.transaction_id)
        .bind(&new.idempotency_key)
        .bind(new.user_id)
        .bind(new.course_id)
        .bind(new.amount)
        .bind(&new.product_info)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_mobile)
        .bind(&new.hash)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the live or successful transaction for an idempotency key.
    /// Terminal failures are excluded; a retry after failure starts a
    /// fresh transaction under the same key.
    pub async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<PaymentTransactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_transaction_by_idempotency_key");
        let result = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            SELECT {TXN_COLUMNS}
            FROM payment_transactions
            WHERE idempotency_key = $1
              AND status IN ('initiated', 'pending', 'success')
            "#,
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentTransactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_transaction_by_transaction_id");
        let result = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            SELECT {TXN_COLUMNS}
            FROM payment_transactions
            WHERE transaction_id = $1
            "#,
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move a non-terminal transaction to a terminal non-success state.
    /// Returns `None` when the row was already terminal, which callers
    /// treat as a lost race rather than an error.
    pub async fn mark_terminal(
        &self,
        transaction_id: &str,
        status: &str,
        update: &CallbackUpdate,
    ) -> Result<Option<PaymentTransactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_transaction_terminal");
        let result = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            UPDATE payment_transactions
            SET status = $2,
                gateway_payment_id = COALESCE($3, gateway_payment_id),
                gateway_txn_id = COALESCE($4, gateway_txn_id),
                response_hash = COALESCE($5, response_hash),
                error_code = $6,
                error_message = $7,
                completed_at = NOW()
            WHERE transaction_id = $1 AND status IN ('initiated', 'pending')
            RETURNING {TXN_COLUMNS}
            "#,
        ))
        .bind(transaction_id)
        .bind(status)
        .bind(update.gateway_payment_id.as_deref())
        .bind(update.gateway_txn_id.as_deref())
        .bind(update.response_hash.as_deref())
        .bind(update.error_code.as_deref())
        .bind(update.error_message.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move an `initiated` transaction to `pending`. Terminal rows and
    /// rows already pending are left untouched.
    pub async fn mark_pending(
        &self,
        transaction_id: &str,
        update: &CallbackUpdate,
    ) -> Result<Option<PaymentTransactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_transaction_pending");
        let result = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            UPDATE payment_transactions
            SET status = 'pending',
                gateway_payment_id = COALESCE($2, gateway_payment_id),
                gateway_txn_id = COALESCE($3, gateway_txn_id),
                response_hash = COALESCE($4, response_hash)
            WHERE transaction_id = $1 AND status IN ('initiated', 'pending')
            RETURNING {TXN_COLUMNS}
            "#,
        ))
        .bind(transaction_id)
        .bind(update.gateway_payment_id.as_deref())
        .bind(update.gateway_txn_id.as_deref())
        .bind(update.response_hash.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The success path: mark the transaction `success` and insert the
    /// entitlement row in one database transaction. Either both writes
    /// commit or neither does.
    ///
    /// The row is locked with FOR UPDATE for the duration of the unit,
    /// and the status flip is conditional on the row still being
    /// non-terminal, so a concurrent duplicate callback observes
    /// `Ok(None)` and grants nothing.
    pub async fn complete_with_entitlement(
        &self,
        transaction_id: &str,
        update: &CallbackUpdate,
        expiry_days: Option<i32>,
    ) -> Result<Option<(PaymentTransactionEntity, EntitlementEntity)>, sqlx::Error> {
        let timer = QueryTimer::new("complete_with_entitlement");
        let result = self
            .complete_with_entitlement_inner(transaction_id, update, expiry_days)
            .await;
        timer.record();
        result
    }

    async fn complete_with_entitlement_inner(
        &self,
        transaction_id: &str,
        update: &CallbackUpdate,
        expiry_days: Option<i32>,
    ) -> Result<Option<(PaymentTransactionEntity, EntitlementEntity)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            SELECT {TXN_COLUMNS}
            FROM payment_transactions
            WHERE transaction_id = $1
            FOR UPDATE
            "#,
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(locked) = locked else {
            tx.rollback().await?;
            return Ok(None);
        };
        if locked.status != "initiated" && locked.status != "pending" {
            tx.rollback().await?;
            return Ok(None);
        }

        let updated = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            UPDATE payment_transactions
            SET status = 'success',
                gateway_payment_id = $2,
                gateway_txn_id = $3,
                response_hash = $4,
                error_code = NULL,
                error_message = NULL,
                completed_at = NOW()
            WHERE transaction_id = $1 AND status IN ('initiated', 'pending')
            RETURNING {TXN_COLUMNS}
            "#,
        ))
        .bind(transaction_id)
        .bind(update.gateway_payment_id.as_deref())
        .bind(update.gateway_txn_id.as_deref())
        .bind(update.response_hash.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let grant = EntitlementGrant {
            user_id: updated.user_id,
            course_id: updated.course_id,
            amount: updated.amount,
            gateway_payment_id: updated.gateway_payment_id.clone(),
            expiry_days,
        };
        let entitlement = insert_grant(&mut *tx, &grant).await?;

        tx.commit().await?;
        Ok(Some((updated, entitlement)))
    }

    /// Payment history for a user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentTransactionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_transactions_for_user");
        let result = sqlx::query_as::<_, PaymentTransactionEntity>(&format!(
            r#"
            SELECT {TXN_COLUMNS}
            FROM payment_transactions
            WHERE user_id = $1
            ORDER BY initiated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_transactions_for_user");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM payment_transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete non-success transactions older than the cutoff. Invoked
    /// by the periodic cleanup job; advisory only.
    pub async fn delete_stale_non_success(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_stale_transactions");
        let result = sqlx::query(
            r#"
            DELETE FROM payment_transactions
            WHERE status <> 'success' AND initiated_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
