//! Course content: uploaded PDFs and externally hosted videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pdf {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub file_name: String,
    /// Opaque location understood by the blob store.
    #[serde(skip_serializing)]
    pub storage_url: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub url: String,
    pub duration_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub course_id: Uuid,

    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: String,

    #[validate(url(message = "Invalid video URL"))]
    pub url: String,

    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration_seconds: Option<i32>,
}
