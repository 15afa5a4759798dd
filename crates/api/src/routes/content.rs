use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use domain::models::CreateVideoRequest;
use uuid::Uuid;
use validator::Validate;

/// Multipart PDF upload. Expects a `title` text field and a `file`
/// field carrying the document.
async fn upload_pdf(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("title") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                title = Some(value);
            }
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                bytes = Some(data.to_vec());
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| ApiError::Validation("title field is required".to_string()))?;
    if title.trim().len() < 2 {
        return Err(ApiError::Validation(
            "title must be at least 2 characters".to_string(),
        ));
    }
    let bytes = bytes.ok_or_else(|| ApiError::Validation("file field is required".to_string()))?;
    let file_name = file_name.unwrap_or_else(|| "document.pdf".to_string());

    let pdf = state
        .content_service()
        .upload_pdf(course_id, title.trim(), &file_name, &bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(pdf)))
}

/// Watermarked download. The response carries the stamped bytes, never
/// the stored original.
async fn download_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (pdf, bytes) = state.content_service().download_pdf(id, &user).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    let disposition = format!("attachment; filename=\"{}\"", pdf.file_name.replace('"', ""));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((headers, bytes))
}

async fn delete_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.content_service().delete_pdf(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_video(
    State(state): State<AppState>,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let video = state.content_service().create_video(&payload).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.content_service().delete_video(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/pdfs/:id/download", get(download_pdf))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/courses/:id/pdfs", post(upload_pdf))
        .route("/pdfs/:id", delete(delete_pdf))
        .route("/videos", post(create_video))
        .route("/videos/:id", delete(delete_video))
}
