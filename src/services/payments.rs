//! Hosted checkout: opening provider sessions and turning completed
//! sessions into orders.

use crate::{
    config::{AppConfig, OrderGranularity},
    entities::{address, cart_item, product, webhook_event},
    errors::ServiceError,
    events::{Event, EventSender, OrderSource},
    models::{
        pricing::{from_minor_units, to_minor_units},
        price_with_discount, PaymentStatus, ProductSnapshot,
    },
    payments::{CheckoutLine, CheckoutSession, CheckoutSessionRequest, PaidLine, PaymentGateway},
    services::{
        cart::CartService,
        orders::{insert_order, NewOrder, NewOrderLine, OrderResponse},
    },
};
use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

const META_USER_ID: &str = "userId";
const META_ADDRESS_ID: &str = "addressId";

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(alias = "addressId", alias = "delivery_address")]
    pub delivery_address_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: Option<String>,
}

impl From<CheckoutSession> for CheckoutSessionResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            session_id: session.session_id,
            url: session.url,
        }
    }
}

/// Provider event envelope; only the fields the handler reads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletedSession {
    id: String,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl CompletedSession {
    fn metadata_uuid(&self, key: &str) -> Result<Uuid, ServiceError> {
        let raw = self.metadata.get(key).ok_or_else(|| {
            ServiceError::ValidationError(format!("checkout session metadata is missing {key}"))
        })?;
        Uuid::parse_str(raw).map_err(|_| {
            ServiceError::ValidationError(format!("checkout session metadata {key} is not a valid id"))
        })
    }
}

#[derive(Debug)]
pub enum WebhookOutcome {
    Ignored { event_type: String },
    Duplicate,
    Processed { orders: Vec<OrderResponse> },
}

/// Paid lines grouped into the orders they will become
fn group_lines(lines: Vec<NewOrderLine>, granularity: OrderGranularity) -> Vec<Vec<NewOrderLine>> {
    match granularity {
        OrderGranularity::PerLine => lines.into_iter().map(|line| vec![line]).collect(),
        OrderGranularity::Single if lines.is_empty() => Vec::new(),
        OrderGranularity::Single => vec![lines],
    }
}

/// Snapshot for a paid line: display fields from the provider, pricing from
/// the product when it still exists.
fn paid_line_snapshot(line: &PaidLine, product: Option<&product::Model>) -> ProductSnapshot {
    match product {
        Some(product) => ProductSnapshot {
            name: line.name.clone(),
            image: if line.images.is_empty() {
                product.images()
            } else {
                line.images.clone()
            },
            unit: product.unit.clone(),
            price: product.price,
            discount: product.discount,
        },
        None => ProductSnapshot {
            name: line.name.clone(),
            image: line.images.clone(),
            unit: String::new(),
            price: from_minor_units(line.amount_total) / Decimal::from(line.quantity.max(1)),
            discount: Decimal::ZERO,
        },
    }
}

#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
            gateway,
        }
    }

    /// Opens a hosted checkout session for the caller's cart.
    ///
    /// Nothing is written locally; orders appear when the provider reports
    /// the session as completed.
    #[instrument(skip(self, customer_email, request), fields(user_id = %user_id))]
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        customer_email: Option<String>,
        request: CheckoutRequest,
    ) -> Result<CheckoutSessionResponse, ServiceError> {
        address::Entity::find_by_id(request.delivery_address_id)
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::Status.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Address {} not found",
                    request.delivery_address_id
                ))
            })?;

        let cart = CartService::load_lines(&*self.db, user_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(cart.len());
        for (item, product) in &cart {
            let product = product.as_ref().ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "Product {} in cart is no longer available",
                    item.product_id
                ))
            })?;
            let unit_amount = to_minor_units(price_with_discount(product.price, product.discount))
                .ok_or_else(|| {
                    ServiceError::InvalidOperation(format!(
                        "Price of product {} cannot be charged",
                        product.id
                    ))
                })?;
            lines.push(CheckoutLine {
                product_id: product.id,
                name: product.name.clone(),
                images: product.images(),
                unit_amount,
                quantity: item.quantity,
            });
        }

        let mut metadata = BTreeMap::new();
        metadata.insert(META_USER_ID.to_string(), user_id.to_string());
        metadata.insert(
            META_ADDRESS_ID.to_string(),
            request.delivery_address_id.to_string(),
        );

        let frontend = self.config.frontend_url.trim_end_matches('/');
        let session = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                customer_email,
                currency: self.config.currency.clone(),
                lines,
                metadata,
                success_url: format!("{frontend}/success"),
                cancel_url: format!("{frontend}/cancel"),
            })
            .await?;

        counter!("payments.checkout_sessions", 1);
        info!(session_id = %session.session_id, "checkout session created");
        self.event_sender
            .send_or_log(Event::CheckoutSessionCreated {
                user_id,
                session_id: session.session_id.clone(),
            })
            .await;

        Ok(session.into())
    }

    /// Applies a provider event. Completed checkout sessions become orders
    /// exactly once per event id; other event types are acknowledged.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle_webhook(&self, event: WebhookEvent) -> Result<WebhookOutcome, ServiceError> {
        if event.event_type != CHECKOUT_COMPLETED {
            info!("ignoring unhandled payment event");
            counter!("payments.webhook_events", 1, "outcome" => "ignored");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        if self.already_processed(&event.id).await? {
            info!("payment event already processed");
            counter!("payments.webhook_events", 1, "outcome" => "duplicate");
            return Ok(WebhookOutcome::Duplicate);
        }

        let started = Instant::now();
        let session: CompletedSession = serde_json::from_value(event.data.object.clone())
            .map_err(|e| ServiceError::ValidationError(format!("invalid checkout session: {e}")))?;
        let user_id = session.metadata_uuid(META_USER_ID)?;
        let delivery_address_id = session.metadata_uuid(META_ADDRESS_ID)?;

        if address::Entity::find_by_id(delivery_address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .is_none()
        {
            warn!(%delivery_address_id, %user_id, "checkout address does not belong to user");
        }

        let paid = self.gateway.list_paid_lines(&session.id).await?;
        let product_ids: Vec<Uuid> = paid.iter().filter_map(|l| l.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines = Vec::with_capacity(paid.len());
        for line in &paid {
            let Some(product_id) = line.product_id else {
                warn!(name = %line.name, "paid line without product id, skipping");
                continue;
            };
            lines.push(NewOrderLine {
                product_id,
                quantity: line.quantity,
                snapshot: paid_line_snapshot(line, products.get(&product_id)),
                line_total: from_minor_units(line.amount_total),
            });
        }
        if lines.is_empty() {
            // Leave the cart and event log untouched so the provider redelivers
            error!(session_id = %session.id, paid_lines = paid.len(), "paid session has no catalog lines");
            counter!("payments.webhook_events", 1, "outcome" => "unfulfillable");
            return Err(ServiceError::ExternalServiceError(format!(
                "Checkout session {} has no paid catalog lines",
                session.id
            )));
        }

        let payment_status = PaymentStatus::from_gateway(session.payment_status.as_deref().unwrap_or(""));
        let txn = self.db.begin().await?;

        if webhook_event::Entity::find_by_id(event.id.clone())
            .one(&txn)
            .await?
            .is_some()
        {
            return Ok(WebhookOutcome::Duplicate);
        }

        let mut orders = Vec::new();
        for group in group_lines(lines, self.config.order_granularity) {
            let amount: Decimal = group.iter().map(|l| l.line_total).sum();
            let order = insert_order(
                &txn,
                NewOrder {
                    user_id,
                    delivery_address_id,
                    payment_status,
                    payment_id: session.payment_intent.clone(),
                    checkout_session_id: Some(session.id.clone()),
                    sub_total_amt: amount,
                    total_amt: amount,
                    lines: group,
                },
            )
            .await?;
            orders.push(order);
        }

        let cleared = cart_item::Entity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;

        webhook_event::ActiveModel {
            event_id: Set(event.id.clone()),
            event_type: Set(event.event_type.clone()),
            processed_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        counter!("payments.webhook_events", 1, "outcome" => "processed");
        counter!("orders.created", orders.len() as u64, "source" => "hosted_checkout");
        histogram!("payments.webhook_duration", started.elapsed());
        info!(orders = orders.len(), cleared, "checkout session fulfilled");

        for order in &orders {
            self.event_sender
                .send_or_log(Event::OrderCreated {
                    order_id: order.id,
                    order_number: order.order_id.clone(),
                    user_id,
                    total_amt: order.total_amt,
                    source: OrderSource::HostedCheckout,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::PaymentConfirmed {
                event_id: event.id,
                session_id: session.id,
                orders_created: orders.len(),
            })
            .await;
        if cleared > 0 {
            self.event_sender
                .send_or_log(Event::CartCleared {
                    user_id,
                    lines: cleared,
                })
                .await;
        }

        Ok(WebhookOutcome::Processed { orders })
    }

    async fn already_processed(&self, event_id: &str) -> Result<bool, ServiceError> {
        Ok(webhook_event::Entity::find_by_id(event_id.to_string())
            .one(&*self.db)
            .await?
            .is_some())
    }
}
