mod common;

use axum::http::{header, Method, StatusCode};
use common::{decimal, response_json, TestApp, TEST_PASSWORD};
use grocery_api::entities::user::UserRole;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn create_category(app: &TestApp, token: &str, name: &str) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/category/add-category",
            Some(json!({ "name": name, "image": format!("https://img.test/{name}.png") })),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_product(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app
        .request(Method::POST, "/api/product/create", Some(body), Some(token))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"].clone()
}

#[tokio::test]
async fn register_then_login_issues_tokens_and_cookies() {
    let app = TestApp::new().await;

    let registered = app
        .request(
            Method::POST,
            "/api/user/register",
            Some(json!({ "name": "Yara", "email": "Yara@Shop.test", "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(registered.status(), StatusCode::CREATED);
    let body = response_json(registered).await;
    assert_eq!(body["data"]["email"], "yara@shop.test");
    assert_eq!(body["data"]["role"], "USER");
    assert!(body["data"].get("password_hash").is_none());

    let duplicate = app
        .request(
            Method::POST,
            "/api/user/register",
            Some(json!({ "name": "Yara", "email": "yara@shop.test", "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let wrong = app
        .request(
            Method::POST,
            "/api/user/login",
            Some(json!({ "email": "yara@shop.test", "password": "not-the-password" })),
            None,
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let login = app
        .request(
            Method::POST,
            "/api/user/login",
            Some(json!({ "email": "yara@shop.test", "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookies: Vec<String> = login
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));

    let body = response_json(login).await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();

    let details = app
        .request(Method::GET, "/api/user/user-details", None, Some(&access))
        .await;
    assert_eq!(details.status(), StatusCode::OK);
    assert_eq!(response_json(details).await["data"]["name"], "Yara");

    // The cookie alone authenticates too
    let cookie = format!("accessToken={access}");
    let via_cookie = app
        .request_raw(
            Method::GET,
            "/api/user/user-details",
            Vec::new(),
            &[("cookie", cookie.as_str())],
        )
        .await;
    assert_eq!(via_cookie.status(), StatusCode::OK);
}

#[tokio::test]
async fn bootstrap_email_registers_as_admin() {
    let app =
        TestApp::with_config(|cfg| cfg.bootstrap_admin_email = Some("boss@shop.test".into())).await;

    let registered = app
        .request(
            Method::POST,
            "/api/user/register",
            Some(json!({ "name": "Boss", "email": "boss@shop.test", "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(registered.status(), StatusCode::CREATED);
    assert_eq!(response_json(registered).await["data"]["role"], "ADMIN");
}

#[tokio::test]
async fn admin_promotes_courier_and_lists_delivery_users() {
    let app = TestApp::new().await;
    let (admin, admin_token) = app.login_as("Admin", UserRole::Admin).await;
    let (rider, _) = app.login_as("Rider", UserRole::User).await;

    let promoted = app
        .request(
            Method::PUT,
            "/api/user/update-role",
            Some(json!({ "userId": rider.id, "role": "DELIVERY" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(promoted.status(), StatusCode::OK);

    let couriers = response_json(
        app.request(Method::GET, "/api/user/delivery-users", None, Some(&admin_token))
            .await,
    )
    .await;
    let couriers = couriers["data"].as_array().unwrap();
    assert_eq!(couriers.len(), 1);
    assert_eq!(couriers[0]["id"], rider.id.to_string());

    let self_demotion = app
        .request(
            Method::PUT,
            "/api/user/update-role",
            Some(json!({ "userId": admin.id, "role": "USER" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(self_demotion.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_writes_need_admin() {
    let app = TestApp::new().await;
    let (_user, user_token) = app.login_as("Shopper", UserRole::User).await;

    let response = app
        .request(
            Method::POST,
            "/api/category/add-category",
            Some(json!({ "name": "Fruit", "image": "https://img.test/fruit.png" })),
            Some(&user_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let public = app.request(Method::GET, "/api/category/get", None, None).await;
    assert_eq!(public.status(), StatusCode::OK);
}

#[tokio::test]
async fn referenced_category_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (_admin, token) = app.login_as("Admin", UserRole::Admin).await;
    let fruit = create_category(&app, &token, "Fruit").await;

    let product = create_product(
        &app,
        &token,
        json!({
            "name": "Mango",
            "image": ["https://img.test/mango.png"],
            "categoryIds": [fruit],
            "unit": "1 kg",
            "stock": 20,
            "price": "180",
            "discount": "5",
            "description": "Alphonso",
            "moreDetails": { "origin": "Ratnagiri" }
        }),
    )
    .await;

    let blocked = app
        .request(
            Method::DELETE,
            "/api/category/delete",
            Some(json!({ "_id": fruit })),
            Some(&token),
        )
        .await;
    assert_eq!(blocked.status(), StatusCode::BAD_REQUEST);

    let removed = app
        .request(
            Method::DELETE,
            "/api/product/delete-product",
            Some(json!({ "_id": product["id"] })),
            Some(&token),
        )
        .await;
    assert_eq!(removed.status(), StatusCode::OK);

    let allowed = app
        .request(
            Method::DELETE,
            "/api/category/delete",
            Some(json!({ "_id": fruit })),
            Some(&token),
        )
        .await;
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_listing_shows_published_products_only() {
    let app = TestApp::new().await;
    let (_admin, token) = app.login_as("Admin", UserRole::Admin).await;
    let veg = create_category(&app, &token, "Vegetables").await;

    let spinach = create_product(
        &app,
        &token,
        json!({
            "name": "Spinach",
            "categoryIds": [veg],
            "unit": "250 g",
            "price": "40",
            "discount": "10",
            "description": "Fresh leafy greens"
        }),
    )
    .await;
    assert_eq!(decimal(&spinach["unit_price"]), dec!(36));

    let hidden = create_product(
        &app,
        &token,
        json!({ "name": "Saffron", "price": "900", "publish": false }),
    )
    .await;

    let listing = response_json(
        app.request(Method::GET, "/api/product/get", None, None)
            .await,
    )
    .await;
    assert_eq!(listing["data"]["total"], 1);
    assert_eq!(listing["data"]["items"][0]["name"], "Spinach");

    let search = response_json(
        app.request(Method::GET, "/api/product/get?search=leafy", None, None)
            .await,
    )
    .await;
    assert_eq!(search["data"]["total"], 1);

    let by_category = response_json(
        app.request(
            Method::GET,
            &format!("/api/product/get?category_id={veg}"),
            None,
            None,
        )
        .await,
    )
    .await;
    assert_eq!(by_category["data"]["total"], 1);

    let unpublished = app
        .request(
            Method::GET,
            &format!("/api/product/get-product-details/{}", hidden["id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(unpublished.status(), StatusCode::NOT_FOUND);

    let details = app
        .request(
            Method::GET,
            &format!("/api/product/get-product-details/{}", spinach["id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(details.status(), StatusCode::OK);
}

#[tokio::test]
async fn more_details_must_be_a_flat_string_map() {
    let app = TestApp::new().await;
    let (_admin, token) = app.login_as("Admin", UserRole::Admin).await;

    let response = app
        .request(
            Method::POST,
            "/api/product/create",
            Some(json!({ "name": "Cheese", "price": "300", "moreDetails": { "aged": 12 } })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn prices_beyond_the_money_column_are_rejected() {
    let app = TestApp::new().await;
    let (_admin, token) = app.login_as("Admin", UserRole::Admin).await;

    let response = app
        .request(
            Method::POST,
            "/api/product/create",
            Some(json!({ "name": "Truffle", "price": "100000000", "discount": "50" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
