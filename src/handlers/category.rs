use crate::{
    entities::category,
    errors::ServiceError,
    handlers::common::{IdInput, JsonBody},
    services::catalog::{CreateCategoryInput, UpdateCategoryInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};

pub fn public_category_routes() -> Router<AppState> {
    Router::new().route("/get", get(list_categories))
}

/// Mounted behind the ADMIN role
pub fn admin_category_routes() -> Router<AppState> {
    Router::new()
        .route("/add-category", post(add_category))
        .route("/update", put(update_category))
        .route("/delete", delete(delete_category))
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<category::Model>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

pub async fn add_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateCategoryInput>,
) -> Result<(StatusCode, Json<ApiResponse<category::Model>>), ServiceError> {
    let created = state.services.catalog.create_category(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(created, "Category added")),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UpdateCategoryInput>,
) -> ApiResult<category::Model> {
    let updated = state.services.catalog.update_category(input).await?;
    Ok(Json(ApiResponse::with_message(updated, "Category updated")))
}

pub async fn delete_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<IdInput>,
) -> ApiResult<()> {
    state.services.catalog.delete_category(input.id).await?;
    Ok(Json(ApiResponse::with_message((), "Category deleted")))
}
