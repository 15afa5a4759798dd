//! One-time password repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::OtpEntity;
use crate::metrics::QueryTimer;

/// Repository for OTP issue, verification and cleanup.
#[derive(Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued code.
    pub async fn create(
        &self,
        mobile: &str,
        code: &str,
        purpose: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_otp");
        let result = sqlx::query_as::<_, OtpEntity>(
            r#"
            INSERT INTO otps (mobile, code, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, mobile, code, purpose, consumed, expires_at, created_at
            "#,
        )
        .bind(mobile)
        .bind(code)
        .bind(purpose)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an unconsumed, unexpired code for the mobile and purpose.
    pub async fn find_valid(
        &self,
        mobile: &str,
        code: &str,
        purpose: &str,
    ) -> Result<Option<OtpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_valid_otp");
        let result = sqlx::query_as::<_, OtpEntity>(
            r#"
            SELECT id, mobile, code, purpose, consumed, expires_at, created_at
            FROM otps
            WHERE mobile = $1 AND code = $2 AND purpose = $3
              AND consumed = false AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(mobile)
        .bind(code)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Mark a code as used. Codes are single-use.
    pub async fn mark_consumed(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("mark_otp_consumed");
        let result = sqlx::query(
            r#"
            UPDATE otps
            SET consumed = true
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Count codes issued to a mobile within the rate-limit window.
    pub async fn count_recent(
        &self,
        mobile: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_recent_otps");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM otps
            WHERE mobile = $1 AND created_at >= $2
            "#,
        )
        .bind(mobile)
        .bind(since)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove expired codes. Invoked by the periodic cleanup job.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_otps");
        let result = sqlx::query(
            r#"
            DELETE FROM otps
            WHERE expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
