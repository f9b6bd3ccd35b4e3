use crate::{
    auth::AuthUser,
    handlers::common::JsonBody,
    services::{delivery::UpdateDeliveryStatusRequest, orders::OrderResponse},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, put},
    Extension, Router,
};

/// Courier routes; mounted behind the DELIVERY role
pub fn delivery_order_routes() -> Router<AppState> {
    Router::new()
        .route("/my-assigned-orders", get(my_assigned_orders))
        .route("/update-delivery-status", put(update_delivery_status))
}

#[utoipa::path(
    get,
    path = "/api/delivery-order/my-assigned-orders",
    responses(
        (status = 200, description = "Orders assigned to the caller", body = [OrderResponse]),
        (status = 403, description = "Caller is not a courier", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery"
)]
pub async fn my_assigned_orders(
    State(state): State<AppState>,
    Extension(courier): Extension<AuthUser>,
) -> ApiResult<Vec<OrderResponse>> {
    let orders = state
        .services
        .delivery
        .my_assigned_orders(courier.user_id)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

#[utoipa::path(
    put,
    path = "/api/delivery-order/update-delivery-status",
    request_body = UpdateDeliveryStatusRequest,
    responses(
        (status = 200, description = "Delivery status updated", body = OrderResponse),
        (status = 400, description = "Move not allowed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Order is assigned to someone else", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    Extension(courier): Extension<AuthUser>,
    JsonBody(request): JsonBody<UpdateDeliveryStatusRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .delivery
        .update_delivery_status(&courier, &request.order_id, request.delivery_status)
        .await?;
    Ok(Json(ApiResponse::with_message(order, "Delivery status updated")))
}
