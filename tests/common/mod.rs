#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use grocery_api::{
    auth::hash_password,
    config::AppConfig,
    db,
    entities::{address, cart_item, product, user, user::UserRole},
    events::{Event, EventSender},
    payments::{
        CheckoutSession, CheckoutSessionRequest, PaidLine, PaymentGateway, PaymentGatewayError,
    },
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str =
    "grocery_integration_secret_0123456789_abcdefghijklmnopqrstuvwxyz_XYZ";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Payment provider double: records opened sessions and serves configured paid lines.
#[derive(Default)]
pub struct MockGateway {
    pub sessions: Mutex<Vec<CheckoutSessionRequest>>,
    pub paid_lines: Mutex<HashMap<String, Vec<PaidLine>>>,
}

impl MockGateway {
    pub fn set_paid_lines(&self, session_id: &str, lines: Vec<PaidLine>) {
        self.paid_lines
            .lock()
            .unwrap()
            .insert(session_id.to_string(), lines);
    }

    pub fn opened_sessions(&self) -> Vec<CheckoutSessionRequest> {
        self.sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(request);
        let session_id = format!("cs_test_{}", sessions.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.test/{session_id}")),
            session_id,
        })
    }

    async fn list_paid_lines(&self, session_id: &str) -> Result<Vec<PaidLine>, PaymentGatewayError> {
        Ok(self
            .paid_lines
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Application wired to a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: Arc<MockGateway>,
    events: Mutex<mpsc::Receiver<Event>>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the app after letting the caller adjust configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection keeps the in-memory database alive and shared
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.db_idle_timeout_secs = 3600;
        cfg.frontend_url = "http://shop.test".to_string();
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let gateway = Arc::new(MockGateway::default());
        let state = AppState::new(
            Arc::new(pool),
            cfg,
            EventSender::new(event_tx),
            gateway.clone(),
        );
        let router = grocery_api::app(state.clone());

        Self {
            router,
            state,
            gateway,
            events: Mutex::new(event_rx),
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Raw body with extra headers, for webhook deliveries.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body)).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Events emitted so far, in order.
    pub fn drain_events(&self) -> Vec<Event> {
        let mut rx = self.events.lock().unwrap();
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    pub async fn seed_user(&self, name: &str, role: UserRole) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(format!("{}-{}@grocery.test", name.to_lowercase(), Uuid::new_v4())),
            password_hash: Set(hash_password(TEST_PASSWORD).expect("hash password")),
            mobile: Set(None),
            role: Set(role),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user")
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        self.state
            .auth
            .generate_token(user)
            .expect("generate token")
            .access_token
    }

    /// A user with the given role plus an access token for it.
    pub async fn login_as(&self, name: &str, role: UserRole) -> (user::Model, String) {
        let user = self.seed_user(name, role).await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, discount: Decimal) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            image: Set(json!([format!("https://img.test/{}.png", name.to_lowercase())])),
            unit: Set("1 pc".to_string()),
            stock: Set(100),
            price: Set(price),
            discount: Set(discount),
            description: Set(format!("{name} from the test farm")),
            more_details: Set(json!({})),
            publish: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_address(&self, user_id: Uuid) -> address::Model {
        let now = Utc::now();
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            address_line: Set("12 Market Road".to_string()),
            city: Set("Pune".to_string()),
            state: Set("MH".to_string()),
            country: Set("India".to_string()),
            pincode: Set("411001".to_string()),
            mobile: Set("9999999999".to_string()),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed address")
    }

    pub async fn seed_cart_line(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> cart_item::Model {
        let now = Utc::now();
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed cart line")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is json")
}

/// Reads a JSON decimal whether it was rendered as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    raw.parse().expect("decimal value")
}
