mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, response_json, TestApp};
use grocery_api::entities::{order, user::UserRole};
use grocery_api::events::Event;
use grocery_api::models::{DeliveryStatus, OrderStatus};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use uuid::Uuid;

/// Places a cash-on-delivery order for a fresh customer and returns its JSON.
async fn place_order(app: &TestApp, name: &str) -> Value {
    let (customer, token) = app.login_as(name, UserRole::User).await;
    let address = app.seed_address(customer.id).await;
    let product = app.seed_product("Paneer", dec!(80), dec!(0)).await;
    app.seed_cart_line(customer.id, product.id, 2).await;

    let response = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(json!({ "addressId": address.id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"].clone()
}

async fn stored(app: &TestApp, id: &str) -> order::Model {
    order::Entity::find_by_id(Uuid::parse_str(id).unwrap())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn assigning_a_non_courier_is_rejected_and_leaves_order_untouched() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let (shopper, _) = app.login_as("Shopper", UserRole::User).await;
    let placed = place_order(&app, "Cara").await;
    let before = stored(&app, placed["id"].as_str().unwrap()).await;

    let response = app
        .request(
            Method::PUT,
            "/api/admin-order/assign-delivery",
            Some(json!({ "orderId": placed["order_id"], "deliveryPersonId": shopper.id })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after = stored(&app, placed["id"].as_str().unwrap()).await;
    assert_eq!(after, before);
    assert!(after.delivery_person_id.is_none());
}

#[tokio::test]
async fn assigning_an_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let placed = place_order(&app, "Cara").await;

    let response = app
        .request(
            Method::PUT,
            "/api/admin-order/assign-delivery",
            Some(json!({ "orderId": placed["id"], "deliveryPersonId": Uuid::new_v4() })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn courier_walks_an_order_to_delivered() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let (courier, courier_token) = app.login_as("Rider", UserRole::Delivery).await;
    let placed = place_order(&app, "Dina").await;
    let order_number = placed["order_id"].as_str().unwrap().to_string();

    let assigned = app
        .request(
            Method::PUT,
            "/api/admin-order/assign-delivery",
            Some(json!({ "orderId": order_number, "deliveryPersonId": courier.id })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(assigned.status(), StatusCode::OK);
    let assigned = response_json(assigned).await;
    assert_eq!(assigned["data"]["delivery_person_name"], "Rider");
    assert_eq!(assigned["data"]["delivery_status"], "Pending");
    assert!(!assigned["data"]["assigned_at"].is_null());

    let queue = response_json(
        app.request(
            Method::GET,
            "/api/delivery-order/my-assigned-orders",
            None,
            Some(&courier_token),
        )
        .await,
    )
    .await;
    assert_eq!(queue["data"].as_array().unwrap().len(), 1);

    for step in ["Accepted", "Picked up"] {
        let response = app
            .request(
                Method::PUT,
                "/api/delivery-order/update-delivery-status",
                Some(json!({ "orderId": order_number, "deliveryStatus": step })),
                Some(&courier_token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "step {step}");
    }
    let midway = stored(&app, placed["id"].as_str().unwrap()).await;
    assert_eq!(midway.delivery_status, DeliveryStatus::PickedUp);
    assert_eq!(midway.order_status, OrderStatus::OutForDelivery);
    assert!(midway.delivered_at.is_none());

    let done = app
        .request(
            Method::PUT,
            "/api/delivery-order/update-delivery-status",
            Some(json!({ "orderId": order_number, "deliveryStatus": "Delivered successfully" })),
            Some(&courier_token),
        )
        .await;
    assert_eq!(done.status(), StatusCode::OK);
    let finished = stored(&app, placed["id"].as_str().unwrap()).await;
    assert_eq!(finished.order_status, OrderStatus::Delivered);
    assert!(finished.delivered_at.is_some());

    let events = app.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::DeliveryAssigned { delivery_person_id, .. } if *delivery_person_id == courier.id)));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::OrderStatusChanged { new_status: OrderStatus::Delivered, .. }
    )));
}

#[tokio::test]
async fn courier_cannot_update_someone_elses_order() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let (assignee, _) = app.login_as("Rider", UserRole::Delivery).await;
    let (_other, other_token) = app.login_as("Other", UserRole::Delivery).await;
    let placed = place_order(&app, "Eli").await;

    let assigned = app
        .request(
            Method::PUT,
            "/api/admin-order/assign-delivery",
            Some(json!({ "orderId": placed["id"], "deliveryPersonId": assignee.id })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(assigned.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PUT,
            "/api/delivery-order/update-delivery-status",
            Some(json!({ "orderId": placed["id"], "deliveryStatus": "Accepted" })),
            Some(&other_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn courier_cannot_skip_acceptance() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let (courier, courier_token) = app.login_as("Rider", UserRole::Delivery).await;
    let placed = place_order(&app, "Fay").await;
    app.request(
        Method::PUT,
        "/api/admin-order/assign-delivery",
        Some(json!({ "orderId": placed["id"], "deliveryPersonId": courier.id })),
        Some(&admin_token),
    )
    .await;

    let response = app
        .request(
            Method::PUT,
            "/api/delivery-order/update-delivery-status",
            Some(json!({ "orderId": placed["id"], "deliveryStatus": "Picked up" })),
            Some(&courier_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivered_stamps_delivered_at_and_other_statuses_do_not() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let placed = place_order(&app, "Gus").await;
    let id = placed["id"].as_str().unwrap();

    for status in ["Ready for Dispatch", "Out for Delivery"] {
        let response = app
            .request(
                Method::PUT,
                "/api/admin-order/update-status",
                Some(json!({ "orderId": id, "orderStatus": status })),
                Some(&admin_token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(stored(&app, id).await.delivered_at.is_none(), "{status}");
    }

    let response = app
        .request(
            Method::PUT,
            "/api/admin-order/update-status",
            Some(json!({ "orderId": id, "orderStatus": "Delivered" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let delivered = stored(&app, id).await;
    assert_eq!(delivered.order_status, OrderStatus::Delivered);
    let stamped = delivered.delivered_at.expect("delivered_at stamped");

    // Re-sending the same status is a no-op
    let again = app
        .request(
            Method::PUT,
            "/api/admin-order/update-status",
            Some(json!({ "orderId": id, "orderStatus": "Delivered" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(stored(&app, id).await.delivered_at, Some(stamped));

    let backwards = app
        .request(
            Method::PUT,
            "/api/admin-order/update-status",
            Some(json!({ "orderId": id, "orderStatus": "Processing" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(backwards.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn closed_orders_cannot_be_assigned() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let (courier, _) = app.login_as("Rider", UserRole::Delivery).await;
    let placed = place_order(&app, "Hal").await;

    let cancelled = app
        .request(
            Method::PUT,
            "/api/admin-order/update-status",
            Some(json!({ "orderId": placed["id"], "orderStatus": "Cancelled" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(cancelled.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PUT,
            "/api/admin-order/assign-delivery",
            Some(json!({ "orderId": placed["id"], "deliveryPersonId": courier.id })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let app = TestApp::new().await;
    let (_user, user_token) = app.login_as("Ivy", UserRole::User).await;
    let (_courier, courier_token) = app.login_as("Rider", UserRole::Delivery).await;

    let as_user = app
        .request(Method::GET, "/api/admin-order/list", None, Some(&user_token))
        .await;
    assert_eq!(as_user.status(), StatusCode::FORBIDDEN);

    let as_courier = app
        .request(Method::GET, "/api/admin-order/dashboard", None, Some(&courier_token))
        .await;
    assert_eq!(as_courier.status(), StatusCode::FORBIDDEN);

    let queue_as_user = app
        .request(
            Method::GET,
            "/api/delivery-order/my-assigned-orders",
            None,
            Some(&user_token),
        )
        .await;
    assert_eq!(queue_as_user.status(), StatusCode::FORBIDDEN);

    let anonymous = app
        .request(Method::GET, "/api/admin-order/list", None, None)
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_list_filters_and_paginates() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let first = place_order(&app, "Jo").await;
    place_order(&app, "Kai").await;
    place_order(&app, "Lin").await;

    app.request(
        Method::PUT,
        "/api/admin-order/update-status",
        Some(json!({ "orderId": first["id"], "orderStatus": "Cancelled" })),
        Some(&admin_token),
    )
    .await;

    let page = response_json(
        app.request(
            Method::GET,
            "/api/admin-order/list?page=1&limit=2",
            None,
            Some(&admin_token),
        )
        .await,
    )
    .await;
    assert_eq!(page["data"]["total"], 3);
    assert_eq!(page["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"]["total_pages"], 2);

    let cancelled = response_json(
        app.request(
            Method::GET,
            "/api/admin-order/list?order_status=Cancelled",
            None,
            Some(&admin_token),
        )
        .await,
    )
    .await;
    assert_eq!(cancelled["data"]["total"], 1);

    let number = first["order_id"].as_str().unwrap();
    let search = response_json(
        app.request(
            Method::GET,
            &format!("/api/admin-order/list?search={}", &number[4..14].to_lowercase()),
            None,
            Some(&admin_token),
        )
        .await,
    )
    .await;
    assert_eq!(search["data"]["total"], 1);
    assert_eq!(search["data"]["items"][0]["order_id"], number);
}

#[tokio::test]
async fn dashboard_summarizes_orders() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let kept = place_order(&app, "Max").await;
    let dropped = place_order(&app, "Noa").await;

    app.request(
        Method::PUT,
        "/api/admin-order/update-status",
        Some(json!({ "orderId": dropped["id"], "orderStatus": "Cancelled" })),
        Some(&admin_token),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/admin-order/dashboard", None, Some(&admin_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let report = &body["data"];

    assert_eq!(report["total_orders"], 2);
    assert_eq!(decimal(&report["total_revenue"]), decimal(&kept["total_amt"]));
    assert_eq!(report["orders_by_status"]["Processing"], 1);
    assert_eq!(report["orders_by_status"]["Cancelled"], 1);
    assert_eq!(report["awaiting_assignment"], 1);
    // Cancelled orders do not count towards best sellers
    assert_eq!(report["top_products"].as_array().unwrap().len(), 1);
    assert_eq!(report["top_products"][0]["quantity_sold"], 2);
}
