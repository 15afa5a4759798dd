use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use domain::models::{Course, CourseFilter, CreateCourseRequest, Pdf, UpdateCourseRequest, Video};
use persistence::repositories::{CourseQuery, CourseRepository, EntitlementRepository};
use serde::Serialize;
use shared::pagination::{Page, Pagination};
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseContentResponse {
    pdfs: Vec<Pdf>,
    videos: Vec<Video>,
}

/// Public catalog listing. Inactive courses are never shown here.
async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = pagination.clamped();
    let repo_query = CourseQuery {
        search: filter.search.clone(),
        category_id: filter.category_id,
        include_inactive: false,
        limit: pagination.limit,
        offset: pagination.offset(),
    };

    let repository = CourseRepository::new(state.pool.clone());
    let courses: Vec<Course> = repository
        .list(&repo_query)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = repository.count(&repo_query).await?;

    Ok(Json(Page::new(courses, pagination, total)))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let course: Course = CourseRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?
        .into();
    if !course.is_active {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }
    Ok(Json(course))
}

/// Courses the caller currently holds access to.
async fn my_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let courses: Vec<Course> = EntitlementRepository::new(state.pool.clone())
        .courses_for_user(user.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(courses))
}

/// Material listing for buyers of the course (and admins).
async fn course_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (pdfs, videos) = state
        .content_service()
        .list_course_content(id, &user)
        .await?;
    Ok(Json(CourseContentResponse { pdfs, videos }))
}

async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let course: Course = CourseRepository::new(state.pool.clone())
        .create(
            &payload.title,
            payload.description.as_deref(),
            payload.category_id,
            payload.price,
            payload.discount_percent,
            payload.expiry_days,
        )
        .await?
        .into();
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let course: Course = CourseRepository::new(state.pool.clone())
        .update(
            id,
            payload.title.as_deref(),
            payload.description.as_deref(),
            payload.category_id,
            payload.price,
            payload.discount_percent,
            payload.expiry_days,
            payload.is_active,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?
        .into();
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = CourseRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/:id", get(get_course))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/courses/mine", get(my_courses))
        .route("/courses/:id/content", get(course_content))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", post(create_course))
        .route("/courses/:id", put(update_course))
        .route("/courses/:id", delete(delete_course))
}
