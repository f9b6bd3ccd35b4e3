use crate::{
    auth::AuthUser,
    handlers::common::JsonBody,
    services::{
        admin_orders::{AdminOrderQuery, OrderPage, UpdateOrderStatusRequest},
        delivery::AssignDeliveryRequest,
        orders::OrderResponse,
        reports::DashboardReport,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use tracing::info;

/// Admin order surface; mounted behind the ADMIN role
pub fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_orders))
        .route("/dashboard", get(dashboard))
        .route("/update-status", put(update_order_status))
        .route("/assign-delivery", put(assign_delivery))
}

#[utoipa::path(
    get,
    path = "/api/admin-order/list",
    params(AdminOrderQuery),
    responses(
        (status = 200, description = "Paginated orders, newest first", body = OrderPage),
        (status = 403, description = "Caller is not an admin", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<AdminOrderQuery>,
) -> ApiResult<OrderPage> {
    let page = state.services.admin_orders.list(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/admin-order/dashboard",
    responses(
        (status = 200, description = "Order aggregates", body = DashboardReport),
        (status = 403, description = "Caller is not an admin", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin Orders"
)]
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardReport> {
    let report = state.services.reports.dashboard().await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    put,
    path = "/api/admin-order/update-status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = OrderResponse),
        (status = 400, description = "Move not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    JsonBody(request): JsonBody<UpdateOrderStatusRequest>,
) -> ApiResult<OrderResponse> {
    info!(admin = %admin.user_id, order = %request.order_id, status = %request.order_status, "admin status update");
    let order = state
        .services
        .admin_orders
        .update_status(&request.order_id, request.order_status)
        .await?;
    Ok(Json(ApiResponse::with_message(order, "Order status updated")))
}

#[utoipa::path(
    put,
    path = "/api/admin-order/assign-delivery",
    request_body = AssignDeliveryRequest,
    responses(
        (status = 200, description = "Courier assigned", body = OrderResponse),
        (status = 400, description = "User is not a courier or order is closed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or user not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin Orders"
)]
pub async fn assign_delivery(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AssignDeliveryRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .delivery
        .assign(&request.order_id, request.delivery_person_id)
        .await?;
    Ok(Json(ApiResponse::with_message(order, "Delivery person assigned")))
}
