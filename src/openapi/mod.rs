use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grocery API",
        version = "0.1.0",
        description = r#"
# Grocery Delivery API

Order lifecycle for a grocery-delivery shop: cart checkout (cash on delivery
or hosted card payment), payment confirmation by webhook, courier assignment
and status tracking.

## Authentication

Send the access token from `POST /api/user/login` either as a bearer token or
through the `accessToken` cookie set by login:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Failures share one envelope:

```json
{
  "success": false,
  "error": true,
  "message": "Cart is empty",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Customer checkout and order history"),
        (name = "Payments", description = "Payment provider callbacks"),
        (name = "Admin Orders", description = "Order administration and dashboard"),
        (name = "Delivery", description = "Courier order queue and progress")
    ),
    paths(
        // Orders
        crate::handlers::orders::cash_on_delivery,
        crate::handlers::orders::create_checkout_session,
        crate::handlers::orders::order_list,

        // Webhooks
        crate::handlers::payment_webhooks::payment_webhook,

        // Admin
        crate::handlers::admin_orders::list_orders,
        crate::handlers::admin_orders::dashboard,
        crate::handlers::admin_orders::update_order_status,
        crate::handlers::admin_orders::assign_delivery,

        // Delivery
        crate::handlers::delivery_orders::my_assigned_orders,
        crate::handlers::delivery_orders::update_delivery_status,
    ),
    components(
        schemas(
            // Order types
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::CashOnDeliveryRequest,
            crate::models::ProductSnapshot,
            crate::models::OrderStatus,
            crate::models::DeliveryStatus,
            crate::models::PaymentStatus,

            // Payments
            crate::services::payments::CheckoutRequest,
            crate::services::payments::CheckoutSessionResponse,
            crate::handlers::payment_webhooks::WebhookAck,

            // Admin and delivery
            crate::services::admin_orders::OrderPage,
            crate::services::admin_orders::UpdateOrderStatusRequest,
            crate::services::delivery::AssignDeliveryRequest,
            crate::services::delivery::UpdateDeliveryStatusRequest,
            crate::services::reports::DashboardReport,
            crate::services::reports::TopProduct,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_order_surface() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Grocery API"));
        assert!(json.contains("/api/order/cash-on-delivery"));
        assert!(json.contains("/api/admin-order/assign-delivery"));
        assert!(json.contains("bearer_auth"));
    }
}
