use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use domain::models::{Category, CreateCategoryRequest};
use persistence::repositories::CategoryRepository;
use uuid::Uuid;
use validator::Validate;

async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories: Vec<Category> = CategoryRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let category: Category = CategoryRepository::new(state.pool.clone())
        .create(&payload.name, payload.description.as_deref())
        .await?
        .into();
    Ok((StatusCode::CREATED, Json(category)))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = CategoryRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route("/categories/:id", delete(delete_category))
}
