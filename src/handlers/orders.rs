use crate::{
    auth::AuthUser,
    handlers::common::JsonBody,
    services::{
        orders::{CashOnDeliveryRequest, OrderResponse},
        payments::{CheckoutRequest, CheckoutSessionResponse},
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};

/// Customer order routes; callers wrap them with authentication
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/cash-on-delivery", post(cash_on_delivery))
        .route("/checkout", post(create_checkout_session))
        .route("/order-list", get(order_list))
}

#[utoipa::path(
    post,
    path = "/api/order/cash-on-delivery",
    request_body = CashOnDeliveryRequest,
    responses(
        (status = 201, description = "Order created from the cart", body = OrderResponse),
        (status = 400, description = "Empty cart or invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Cart changed during checkout", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cash_on_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<CashOnDeliveryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), crate::errors::ServiceError> {
    let order = state
        .services
        .orders
        .create_cash_on_delivery(user.user_id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(order, "Order placed successfully")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/order/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout session opened", body = CheckoutSessionResponse),
        (status = 400, description = "Empty cart or payments unavailable", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment provider failure", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> ApiResult<CheckoutSessionResponse> {
    let session = state
        .services
        .payments
        .create_checkout_session(user.user_id, user.email.clone(), request)
        .await?;
    Ok(Json(ApiResponse::success(session)))
}

#[utoipa::path(
    get,
    path = "/api/order/order-list",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = [OrderResponse]),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<OrderResponse>> {
    let orders = state.services.orders.list_for_user(user.user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}
