//! Course repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CourseEntity;
use crate::metrics::QueryTimer;

const COURSE_COLUMNS: &str = "id, title, description, category_id, price, discount_percent, \
                              expiry_days, is_active, created_at, updated_at";

/// Listing filters pushed down to SQL.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    /// Admin listings include inactive courses; public listings do not.
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        category_id: Option<Uuid>,
        price: Decimal,
        discount_percent: Decimal,
        expiry_days: Option<i32>,
    ) -> Result<CourseEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_course");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            INSERT INTO courses (title, description, category_id, price, discount_percent, expiry_days)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COURSE_COLUMNS}
            "#,
        ))
        .bind(title)
        .bind(description)
        .bind(category_id)
        .bind(price)
        .bind(discount_percent)
        .bind(expiry_days)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_course_by_id");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List courses matching the filter, newest first.
    pub async fn list(&self, query: &CourseQuery) -> Result<Vec<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_courses");
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1)
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3 OR is_active)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        ))
        .bind(pattern.as_deref())
        .bind(query.category_id)
        .bind(query.include_inactive)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Total rows matching the filter, for pagination.
    pub async fn count(&self, query: &CourseQuery) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_courses");
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM courses
            WHERE ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1)
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3 OR is_active)
            "#,
        )
        .bind(pattern.as_deref())
        .bind(query.category_id)
        .bind(query.include_inactive)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update. Absent fields keep their current value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        category_id: Option<Uuid>,
        price: Option<Decimal>,
        discount_percent: Option<Decimal>,
        expiry_days: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<Option<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_course");
        let result = sqlx::query_as::<_, CourseEntity>(&format!(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                price = COALESCE($5, price),
                discount_percent = COALESCE($6, discount_percent),
                expiry_days = COALESCE($7, expiry_days),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category_id)
        .bind(price)
        .bind(discount_percent)
        .bind(expiry_days)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_course");
        let result = sqlx::query(
            r#"
            DELETE FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}
