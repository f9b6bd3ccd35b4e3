pub mod address;
pub mod admin_orders;
pub mod cart;
pub mod category;
pub mod common;
pub mod delivery_orders;
pub mod orders;
pub mod payment_webhooks;
pub mod product;
pub mod subcategory;
pub mod users;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::payments::PaymentGateway;
use crate::services::{
    addresses::AddressService, admin_orders::AdminOrderService, cart::CartService,
    catalog::CatalogService, delivery::DeliveryService, orders::OrderService,
    payments::PaymentService, reports::ReportService, users::UserService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub admin_orders: Arc<AdminOrderService>,
    pub delivery: Arc<DeliveryService>,
    pub reports: Arc<ReportService>,
    pub cart: Arc<CartService>,
    pub addresses: Arc<AddressService>,
    pub catalog: Arc<CatalogService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
        config: Arc<AppConfig>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            payments: Arc::new(PaymentService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
                gateway,
            )),
            admin_orders: Arc::new(AdminOrderService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            delivery: Arc::new(DeliveryService::new(db.clone(), event_sender.clone())),
            reports: Arc::new(ReportService::new(db.clone())),
            cart: Arc::new(CartService::new(db.clone())),
            addresses: Arc::new(AddressService::new(db.clone())),
            catalog: Arc::new(CatalogService::new(db.clone(), config.clone())),
            users: Arc::new(UserService::new(db, auth_service, event_sender, config)),
        }
    }
}
