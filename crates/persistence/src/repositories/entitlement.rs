//! Entitlement repository for database operations.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::entities::{CourseEntity, EntitlementEntity};
use crate::metrics::QueryTimer;

/// Fields for a new entitlement row. Only the payment success path
/// constructs one of these.
#[derive(Debug, Clone)]
pub struct EntitlementGrant {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub gateway_payment_id: Option<String>,
    pub expiry_days: Option<i32>,
}

/// Inserts a grant using the caller's executor so it can run inside the
/// payment success transaction. Not exposed outside the crate; API-level
/// code never grants entitlements directly.
///
/// `NOW()` is the transaction timestamp, so the expiry is exactly the
/// transaction's `completed_at` plus the course's expiry window. The
/// partial unique index on completed grants turns a second successful
/// payment for the same pair into a refresh of the existing row, so a
/// user is never granted twice.
pub(crate) async fn insert_grant<'e, E>(
    executor: E,
    grant: &EntitlementGrant,
) -> Result<EntitlementEntity, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, EntitlementEntity>(
        r#"
        INSERT INTO user_courses (user_id, course_id, amount, gateway_payment_id, status, expiry_date)
        VALUES ($1, $2, $3, $4, 'completed', NOW() + make_interval(days => $5))
        ON CONFLICT (user_id, course_id) WHERE status = 'completed'
        DO UPDATE SET amount = EXCLUDED.amount,
                      gateway_payment_id = EXCLUDED.gateway_payment_id,
                      expiry_date = EXCLUDED.expiry_date,
                      granted_at = NOW()
        RETURNING id, user_id, course_id, amount, gateway_payment_id, status, expiry_date, granted_at
        "#,
    )
    .bind(grant.user_id)
    .bind(grant.course_id)
    .bind(grant.amount)
    .bind(grant.gateway_payment_id.as_deref())
    .bind(grant.expiry_days)
    .fetch_one(executor)
    .await
}

#[derive(Clone)]
pub struct EntitlementRepository {
    pool: PgPool,
}

impl EntitlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// True iff a completed entitlement exists with expiry strictly in
    /// the future (or no expiry at all).
    pub async fn has_access(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_access");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_courses
                WHERE user_id = $1 AND course_id = $2
                  AND status = 'completed'
                  AND (expiry_date IS NULL OR expiry_date > NOW())
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All entitlements ever granted to a user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EntitlementEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_entitlements_for_user");
        let result = sqlx::query_as::<_, EntitlementEntity>(
            r#"
            SELECT id, user_id, course_id, amount, gateway_payment_id, status, expiry_date, granted_at
            FROM user_courses
            WHERE user_id = $1
            ORDER BY granted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Courses the user currently holds access to, through completed
    /// entitlements that have not expired. Newest purchase first.
    pub async fn courses_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("courses_for_user");
        let result = sqlx::query_as::<_, CourseEntity>(
            r#"
            SELECT c.id, c.title, c.description, c.category_id, c.price, c.discount_percent,
                   c.expiry_days, c.is_active, c.created_at, c.updated_at
            FROM courses c
            JOIN user_courses uc ON uc.course_id = c.id
            WHERE uc.user_id = $1
              AND uc.status = 'completed'
              AND (uc.expiry_date IS NULL OR uc.expiry_date > NOW())
            ORDER BY uc.granted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count entitlement rows for a user/course pair. Used by tests and
    /// reconciliation tooling to assert the exactly-once grant.
    pub async fn count_for_pair(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_entitlements_for_pair");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_courses
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
