//! PDF and video repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{PdfEntity, VideoEntity};
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_pdf(
        &self,
        course_id: Uuid,
        title: &str,
        file_name: &str,
        storage_url: &str,
        size_bytes: i64,
    ) -> Result<PdfEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_pdf");
        let result = sqlx::query_as::<_, PdfEntity>(
            r#"
            INSERT INTO pdfs (course_id, title, file_name, storage_url, size_bytes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, course_id, title, file_name, storage_url, size_bytes, created_at
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(file_name)
        .bind(storage_url)
        .bind(size_bytes)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_pdf_by_id(&self, id: Uuid) -> Result<Option<PdfEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_pdf_by_id");
        let result = sqlx::query_as::<_, PdfEntity>(
            r#"
            SELECT id, course_id, title, file_name, storage_url, size_bytes, created_at
            FROM pdfs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_pdfs_by_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<PdfEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_pdfs_by_course");
        let result = sqlx::query_as::<_, PdfEntity>(
            r#"
            SELECT id, course_id, title, file_name, storage_url, size_bytes, created_at
            FROM pdfs
            WHERE course_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_pdf(&self, id: Uuid) -> Result<Option<PdfEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_pdf");
        let result = sqlx::query_as::<_, PdfEntity>(
            r#"
            DELETE FROM pdfs
            WHERE id = $1
            RETURNING id, course_id, title, file_name, storage_url, size_bytes, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create_video(
        &self,
        course_id: Uuid,
        title: &str,
        url: &str,
        duration_seconds: Option<i32>,
    ) -> Result<VideoEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_video");
        let result = sqlx::query_as::<_, VideoEntity>(
            r#"
            INSERT INTO videos (course_id, title, url, duration_seconds)
            VALUES ($1, $2, $3, $4)
            RETURNING id, course_id, title, url, duration_seconds, created_at
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(url)
        .bind(duration_seconds)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_videos_by_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<VideoEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_videos_by_course");
        let result = sqlx::query_as::<_, VideoEntity>(
            r#"
            SELECT id, course_id, title, url, duration_seconds, created_at
            FROM videos
            WHERE course_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_video(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_video");
        let result = sqlx::query(
            r#"
            DELETE FROM videos
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
