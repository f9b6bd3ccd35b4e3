mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, response_json, TestApp};
use grocery_api::config::OrderGranularity;
use grocery_api::entities::{cart_history, cart_item, order, user::UserRole, webhook_event};
use grocery_api::handlers::payment_webhooks::{sign, SIGNATURE_HEADER};
use grocery_api::models::PaymentStatus;
use grocery_api::payments::PaidLine;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use uuid::Uuid;

const WEBHOOK: &str = "/api/order/webhook";

fn completed_event(event_id: &str, session_id: &str, user_id: Uuid, address_id: Uuid) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": "pi_test_123",
                "payment_status": "paid",
                "metadata": {
                    "userId": user_id.to_string(),
                    "addressId": address_id.to_string(),
                }
            }
        }
    })
}

fn paid(product_id: Uuid, name: &str, quantity: i32, amount_total: i64) -> PaidLine {
    PaidLine {
        product_id: Some(product_id),
        name: name.to_string(),
        images: vec![format!("https://img.test/{name}.png")],
        quantity,
        amount_total,
    }
}

async fn deliver(app: &TestApp, event: &Value) -> (StatusCode, Value) {
    let response = app
        .request_raw(Method::POST, WEBHOOK, serde_json::to_vec(event).unwrap(), &[])
        .await;
    let status = response.status();
    (status, response_json(response).await)
}

#[tokio::test]
async fn checkout_session_carries_discounted_lines_and_metadata() {
    let app = TestApp::new().await;
    let (customer, token) = app.login_as("Priya", UserRole::User).await;
    let address = app.seed_address(customer.id).await;
    let atta = app.seed_product("Atta", dec!(100), dec!(10)).await;
    app.seed_cart_line(customer.id, atta.id, 2).await;

    let response = app
        .request(
            Method::POST,
            "/api/order/checkout",
            Some(json!({ "addressId": address.id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["session_id"], "cs_test_1");
    assert!(body["data"]["url"].as_str().unwrap().contains("cs_test_1"));

    let sessions = app.gateway.opened_sessions();
    assert_eq!(sessions.len(), 1);
    let session = &sessions[0];
    assert_eq!(session.lines.len(), 1);
    assert_eq!(session.lines[0].product_id, atta.id);
    assert_eq!(session.lines[0].unit_amount, 9000);
    assert_eq!(session.lines[0].quantity, 2);
    assert_eq!(session.customer_email.as_deref(), Some(customer.email.as_str()));
    assert_eq!(session.metadata["userId"], customer.id.to_string());
    assert_eq!(session.metadata["addressId"], address.id.to_string());
    assert_eq!(session.success_url, "http://shop.test/success");
    assert_eq!(session.cancel_url, "http://shop.test/cancel");

    // Orders only appear once the provider confirms payment
    assert_eq!(order::Entity::find().count(&*app.state.db).await.unwrap(), 0);
    assert_eq!(cart_item::Entity::find().count(&*app.state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let (customer, token) = app.login_as("Priya", UserRole::User).await;
    let address = app.seed_address(customer.id).await;

    let response = app
        .request(
            Method::POST,
            "/api/order/checkout",
            Some(json!({ "addressId": address.id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.gateway.opened_sessions().is_empty());
}

#[tokio::test]
async fn completed_session_creates_one_order_per_paid_line() {
    let app = TestApp::new().await;
    let (customer, _) = app.login_as("Sam", UserRole::User).await;
    let address = app.seed_address(customer.id).await;
    let apples = app.seed_product("Apples", dec!(120), dec!(0)).await;
    let honey = app.seed_product("Honey", dec!(300), dec!(10)).await;
    app.seed_cart_line(customer.id, apples.id, 1).await;
    app.seed_cart_line(customer.id, honey.id, 2).await;
    app.gateway.set_paid_lines(
        "cs_live_1",
        vec![
            paid(apples.id, "Apples", 1, 12_000),
            paid(honey.id, "Honey", 2, 54_000),
        ],
    );

    let (status, body) = deliver(
        &app,
        &completed_event("evt_1", "cs_live_1", customer.id, address.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "processed");
    assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 2);

    let db = &*app.state.db;
    let orders = order::Entity::find().all(db).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.payment_status == PaymentStatus::Paid));
    assert!(orders
        .iter()
        .all(|o| o.payment_id.as_deref() == Some("pi_test_123")));
    let mut totals: Vec<_> = orders.iter().map(|o| o.total_amt).collect();
    totals.sort();
    assert_eq!(totals, vec![dec!(120), dec!(540)]);

    assert_eq!(cart_item::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(cart_history::Entity::find().count(db).await.unwrap(), 2);
    assert!(webhook_event::Entity::find_by_id("evt_1".to_string())
        .one(db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn single_granularity_groups_lines_into_one_order() {
    let app = TestApp::with_config(|cfg| cfg.order_granularity = OrderGranularity::Single).await;
    let (customer, token) = app.login_as("Sam", UserRole::User).await;
    let address = app.seed_address(customer.id).await;
    let apples = app.seed_product("Apples", dec!(120), dec!(0)).await;
    let honey = app.seed_product("Honey", dec!(300), dec!(10)).await;
    app.gateway.set_paid_lines(
        "cs_live_2",
        vec![
            paid(apples.id, "Apples", 1, 12_000),
            paid(honey.id, "Honey", 2, 54_000),
        ],
    );

    let (status, _) = deliver(
        &app,
        &completed_event("evt_2", "cs_live_2", customer.id, address.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let list = response_json(
        app.request(Method::GET, "/api/order/order-list", None, Some(&token))
            .await,
    )
    .await;
    let orders = list["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&orders[0]["total_amt"]), dec!(660));
    assert_eq!(orders[0]["payment_status"], "PAID");
}

#[tokio::test]
async fn redelivered_event_is_acknowledged_without_new_orders() {
    let app = TestApp::new().await;
    let (customer, _) = app.login_as("Lee", UserRole::User).await;
    let address = app.seed_address(customer.id).await;
    let dal = app.seed_product("Dal", dec!(90), dec!(0)).await;
    app.gateway
        .set_paid_lines("cs_dup", vec![paid(dal.id, "Dal", 1, 9_000)]);
    let event = completed_event("evt_dup", "cs_dup", customer.id, address.id);

    let (first, _) = deliver(&app, &event).await;
    assert_eq!(first, StatusCode::OK);
    let (second, body) = deliver(&app, &event).await;
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "duplicate");

    assert_eq!(order::Entity::find().count(&*app.state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn unrelated_event_types_are_ignored() {
    let app = TestApp::new().await;
    let event = json!({
        "id": "evt_other",
        "type": "payment_intent.created",
        "data": { "object": {} }
    });

    let (status, body) = deliver(&app, &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "ignored");
    assert_eq!(order::Entity::find().count(&*app.state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_metadata_fails_the_event() {
    let app = TestApp::new().await;
    let event = json!({
        "id": "evt_bad",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_bad", "metadata": { "userId": Uuid::new_v4().to_string() } } }
    });

    let (status, body) = deliver(&app, &event).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(webhook_event::Entity::find_by_id("evt_bad".to_string())
        .one(&*app.state.db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn signed_webhooks_are_verified_when_a_secret_is_set() {
    let secret = "whsec_integration";
    let app =
        TestApp::with_config(|cfg| cfg.payment_webhook_secret = Some(secret.to_string())).await;
    let event = json!({
        "id": "evt_signed",
        "type": "customer.created",
        "data": { "object": {} }
    });
    let payload = serde_json::to_vec(&event).unwrap();

    let unsigned = app
        .request_raw(Method::POST, WEBHOOK, payload.clone(), &[])
        .await;
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

    let timestamp = chrono::Utc::now().timestamp().to_string();
    let bad = format!("t={timestamp},v1={}", "0".repeat(64));
    let forged = app
        .request_raw(Method::POST, WEBHOOK, payload.clone(), &[(SIGNATURE_HEADER, &bad)])
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let signature = sign(secret, &timestamp, &payload).unwrap();
    let header = format!("t={timestamp},v1={signature}");
    let accepted = app
        .request_raw(Method::POST, WEBHOOK, payload, &[(SIGNATURE_HEADER, &header)])
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_without_catalog_lines_is_left_for_redelivery() {
    let app = TestApp::new().await;
    let (customer, _) = app.login_as("Ravi", UserRole::User).await;
    let address = app.seed_address(customer.id).await;
    let rice = app.seed_product("Rice", dec!(80), dec!(0)).await;
    app.seed_cart_line(customer.id, rice.id, 1).await;
    app.gateway.set_paid_lines(
        "cs_orphan",
        vec![PaidLine {
            product_id: None,
            name: "Delivery tip".to_string(),
            images: Vec::new(),
            quantity: 1,
            amount_total: 2_000,
        }],
    );

    let (status, body) = deliver(
        &app,
        &completed_event("evt_orphan", "cs_orphan", customer.id, address.id),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let db = &*app.state.db;
    assert_eq!(order::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(cart_item::Entity::find().count(db).await.unwrap(), 1);
    assert!(webhook_event::Entity::find_by_id("evt_orphan".to_string())
        .one(db)
        .await
        .unwrap()
        .is_none());
}
