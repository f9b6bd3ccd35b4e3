use crate::{
    errors::ServiceError,
    handlers::common::{IdInput, JsonBody},
    services::catalog::{CreateSubCategoryInput, SubCategoryView, UpdateSubCategoryInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};

pub fn public_sub_category_routes() -> Router<AppState> {
    Router::new().route("/get", get(list_sub_categories))
}

/// Mounted behind the ADMIN role
pub fn admin_sub_category_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_sub_category))
        .route("/update", put(update_sub_category))
        .route("/delete", delete(delete_sub_category))
}

pub async fn list_sub_categories(State(state): State<AppState>) -> ApiResult<Vec<SubCategoryView>> {
    let sub_categories = state.services.catalog.list_sub_categories().await?;
    Ok(Json(ApiResponse::success(sub_categories)))
}

pub async fn create_sub_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateSubCategoryInput>,
) -> Result<(StatusCode, Json<ApiResponse<SubCategoryView>>), ServiceError> {
    let created = state.services.catalog.create_sub_category(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(created, "Sub-category created")),
    ))
}

pub async fn update_sub_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UpdateSubCategoryInput>,
) -> ApiResult<SubCategoryView> {
    let updated = state.services.catalog.update_sub_category(input).await?;
    Ok(Json(ApiResponse::with_message(updated, "Sub-category updated")))
}

pub async fn delete_sub_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<IdInput>,
) -> ApiResult<()> {
    state.services.catalog.delete_sub_category(input.id).await?;
    Ok(Json(ApiResponse::with_message((), "Sub-category deleted")))
}
