use crate::error::ApiError;
use crate::extractors::AuthUser;
use domain::models::{CreateVideoRequest, Pdf, User, Video};
use domain::services::{BlobStore, CollaboratorError, Watermarker};
use persistence::repositories::{ContentRepository, EntitlementRepository, UserRepository};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Document not found")]
    PdfNotFound,
    #[error("Video not found")]
    VideoNotFound,
    #[error("Course access required")]
    NotEntitled,
    #[error("User not found")]
    UserNotFound,
    #[error("Only PDF files can be uploaded here")]
    NotAPdf,
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::PdfNotFound
            | ContentError::VideoNotFound
            | ContentError::UserNotFound => ApiError::NotFound(err.to_string()),
            ContentError::NotEntitled => ApiError::Forbidden(err.to_string()),
            ContentError::NotAPdf => ApiError::Validation(err.to_string()),
            ContentError::Collaborator(e) => e.into(),
            ContentError::Database(e) => e.into(),
        }
    }
}

/// Course material: PDF storage and watermarked delivery, video links.
pub struct ContentService {
    content: ContentRepository,
    entitlements: EntitlementRepository,
    users: UserRepository,
    blob_store: Arc<dyn BlobStore>,
    watermarker: Arc<dyn Watermarker>,
}

impl ContentService {
    pub fn new(
        pool: PgPool,
        blob_store: Arc<dyn BlobStore>,
        watermarker: Arc<dyn Watermarker>,
    ) -> Self {
        Self {
            content: ContentRepository::new(pool.clone()),
            entitlements: EntitlementRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            blob_store,
            watermarker,
        }
    }

    pub async fn upload_pdf(
        &self,
        course_id: Uuid,
        title: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Pdf, ContentError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ContentError::NotAPdf);
        }
        let location = self.blob_store.save(file_name, bytes).await?;
        let pdf = self
            .content
            .create_pdf(course_id, title, file_name, &location, bytes.len() as i64)
            .await?;
        tracing::info!(pdf_id = %pdf.id, course_id = %course_id, "PDF uploaded");
        Ok(pdf.into())
    }

    /// Returns the PDF bytes stamped with the downloader's identity.
    /// Every download is stamped fresh; the stored blob stays clean.
    pub async fn download_pdf(
        &self,
        pdf_id: Uuid,
        caller: &AuthUser,
    ) -> Result<(Pdf, Vec<u8>), ContentError> {
        let pdf: Pdf = self
            .content
            .find_pdf_by_id(pdf_id)
            .await?
            .ok_or(ContentError::PdfNotFound)?
            .into();

        self.ensure_course_access(pdf.course_id, caller).await?;

        let user: User = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or(ContentError::UserNotFound)?
            .into();

        let bytes = self.blob_store.read(&pdf.storage_url).await?;
        let identifier = format!("{} ({})", user.email, user.mobile);
        let stamped = self.watermarker.stamp(&bytes, &identifier)?;

        tracing::info!(pdf_id = %pdf.id, user_id = %user.id, "PDF downloaded");
        Ok((pdf, stamped))
    }

    /// Course material listing, entitlement-gated like downloads.
    pub async fn list_course_content(
        &self,
        course_id: Uuid,
        caller: &AuthUser,
    ) -> Result<(Vec<Pdf>, Vec<Video>), ContentError> {
        self.ensure_course_access(course_id, caller).await?;

        let pdfs = self
            .content
            .list_pdfs_by_course(course_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let videos = self
            .content
            .list_videos_by_course(course_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((pdfs, videos))
    }

    pub async fn delete_pdf(&self, pdf_id: Uuid) -> Result<(), ContentError> {
        let deleted = self
            .content
            .delete_pdf(pdf_id)
            .await?
            .ok_or(ContentError::PdfNotFound)?;

        // The row is gone; a stranded blob only wastes disk.
        if let Err(err) = self.blob_store.delete(&deleted.storage_url).await {
            tracing::warn!(pdf_id = %pdf_id, error = %err, "Blob removal failed");
        }
        Ok(())
    }

    pub async fn create_video(&self, request: &CreateVideoRequest) -> Result<Video, ContentError> {
        let video = self
            .content
            .create_video(
                request.course_id,
                &request.title,
                &request.url,
                request.duration_seconds,
            )
            .await?;
        Ok(video.into())
    }

    pub async fn delete_video(&self, video_id: Uuid) -> Result<(), ContentError> {
        if !self.content.delete_video(video_id).await? {
            return Err(ContentError::VideoNotFound);
        }
        Ok(())
    }

    async fn ensure_course_access(
        &self,
        course_id: Uuid,
        caller: &AuthUser,
    ) -> Result<(), ContentError> {
        if caller.is_admin() {
            return Ok(());
        }
        if self
            .entitlements
            .has_access(caller.user_id, course_id)
            .await?
        {
            return Ok(());
        }
        Err(ContentError::NotEntitled)
    }
}
