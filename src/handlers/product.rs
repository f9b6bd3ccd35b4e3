use crate::{
    errors::ServiceError,
    handlers::common::{IdInput, JsonBody},
    services::catalog::{CreateProductInput, ProductPage, ProductQuery, ProductView, UpdateProductInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;

pub fn public_product_routes() -> Router<AppState> {
    Router::new()
        .route("/get", get(list_products))
        .route("/get-product-details/:id", get(get_product))
}

/// Mounted behind the ADMIN role
pub fn admin_product_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_product))
        .route("/update-product-details", put(update_product))
        .route("/delete-product", delete(delete_product))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<ProductPage> {
    let page = state.services.catalog.list_products(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductView> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductView>>), ServiceError> {
    let product = state.services.catalog.create_product(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(product, "Product created")),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UpdateProductInput>,
) -> ApiResult<ProductView> {
    let product = state.services.catalog.update_product(input).await?;
    Ok(Json(ApiResponse::with_message(product, "Product updated")))
}

pub async fn delete_product(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<IdInput>,
) -> ApiResult<()> {
    state.services.catalog.delete_product(input.id).await?;
    Ok(Json(ApiResponse::with_message((), "Product deleted")))
}
