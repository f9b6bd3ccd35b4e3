use crate::{
    auth::AuthUser,
    entities::cart_item,
    handlers::common::{IdInput, JsonBody},
    services::cart::{AddToCartInput, CartSummary, UpdateCartQuantityInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};

/// Cart routes; callers wrap them with authentication
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(add_to_cart))
        .route("/get", get(get_cart))
        .route("/update-qty", put(update_quantity))
        .route("/delete-cart-item", delete(remove_item))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<AddToCartInput>,
) -> ApiResult<cart_item::Model> {
    let line = state.services.cart.add_item(user.user_id, input).await?;
    Ok(Json(ApiResponse::with_message(line, "Item added to cart")))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<CartSummary> {
    let cart = state.services.cart.get_cart(user.user_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Quantity zero removes the line and returns `data: null`
pub async fn update_quantity(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<UpdateCartQuantityInput>,
) -> ApiResult<Option<cart_item::Model>> {
    let line = state
        .services
        .cart
        .update_quantity(user.user_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(line, "Cart updated")))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<IdInput>,
) -> ApiResult<()> {
    state.services.cart.remove_item(user.user_id, input.id).await?;
    Ok(Json(ApiResponse::with_message((), "Item removed from cart")))
}
