//! Catalog entities: categories, courses, PDFs and videos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the categories table.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryEntity> for domain::models::Category {
    fn from(entity: CategoryEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the courses table. Monetary columns are
/// NUMERIC, never floats.
#[derive(Debug, Clone, FromRow)]
pub struct CourseEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub expiry_days: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourseEntity> for domain::models::Course {
    fn from(entity: CourseEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            category_id: entity.category_id,
            price: entity.price,
            discount_percent: entity.discount_percent,
            expiry_days: entity.expiry_days,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the pdfs table.
#[derive(Debug, Clone, FromRow)]
pub struct PdfEntity {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub storage_url: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PdfEntity> for domain::models::Pdf {
    fn from(entity: PdfEntity) -> Self {
        Self {
            id: entity.id,
            course_id: entity.course_id,
            title: entity.title,
            file_name: entity.file_name,
            storage_url: entity.storage_url,
            size_bytes: entity.size_bytes,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the videos table.
#[derive(Debug, Clone, FromRow)]
pub struct VideoEntity {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub url: String,
    pub duration_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<VideoEntity> for domain::models::Video {
    fn from(entity: VideoEntity) -> Self {
        Self {
            id: entity.id,
            course_id: entity.course_id,
            title: entity.title,
            url: entity.url,
            duration_seconds: entity.duration_seconds,
            created_at: entity.created_at,
        }
    }
}
