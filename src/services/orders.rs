use crate::{
    config::AppConfig,
    entities::{address, cart_history, cart_item, order, order_item, product},
    errors::ServiceError,
    events::{Event, EventSender, OrderSource},
    models::{
        generate_order_id, price_with_discount, DeliveryStatus, OrderStatus, PaymentStatus,
        ProductSnapshot,
    },
    services::cart::CartService,
};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Cash-on-delivery checkout request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CashOnDeliveryRequest {
    #[serde(alias = "addressId", alias = "delivery_address")]
    pub delivery_address_id: Uuid,
    /// Client-computed list-price total; informational unless totals are trusted
    #[serde(default, alias = "subTotalAmt")]
    pub sub_total_amt: Option<Decimal>,
    /// Client-computed payable total; informational unless totals are trusted
    #[serde(default, alias = "totalAmt")]
    pub total_amt: Option<Decimal>,
}

/// An order line as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub product_details: ProductSnapshot,
    pub line_total: Decimal,
}

/// Order with its items
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub delivery_address_id: Uuid,
    pub order_status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub sub_total_amt: Decimal,
    pub total_amt: Decimal,
    pub delivery_person_id: Option<Uuid>,
    pub delivery_person_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn from_parts(order: order::Model, items: Vec<order_item::Model>) -> Result<Self, ServiceError> {
        let items = items
            .into_iter()
            .map(|item| {
                Ok(OrderItemResponse {
                    product_details: item.snapshot()?,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    line_total: item.line_total,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        Ok(Self {
            id: order.id,
            order_id: order.order_id,
            user_id: order.user_id,
            delivery_address_id: order.delivery_address_id,
            order_status: order.order_status,
            delivery_status: order.delivery_status,
            payment_status: order.payment_status,
            payment_id: order.payment_id,
            sub_total_amt: order.sub_total_amt,
            total_amt: order.total_amt,
            delivery_person_id: order.delivery_person_id,
            delivery_person_name: order.delivery_person_name,
            assigned_at: order.assigned_at,
            delivered_at: order.delivered_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items,
        })
    }
}

/// A priced line ready to be written as an order item
#[derive(Debug, Clone)]
pub(crate) struct NewOrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub snapshot: ProductSnapshot,
    pub line_total: Decimal,
}

#[derive(Debug, Clone)]
pub(crate) struct NewOrder {
    pub user_id: Uuid,
    pub delivery_address_id: Uuid,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub sub_total_amt: Decimal,
    pub total_amt: Decimal,
    pub lines: Vec<NewOrderLine>,
}

/// Writes an order, its items and one cart-history row per line.
///
/// Callers own the transaction; nothing here commits.
pub(crate) async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    new: NewOrder,
) -> Result<OrderResponse, ServiceError> {
    if new.lines.is_empty() {
        return Err(ServiceError::EmptyCart);
    }

    let now = Utc::now();
    let order = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(generate_order_id()),
        user_id: Set(new.user_id),
        delivery_address_id: Set(new.delivery_address_id),
        order_status: Set(OrderStatus::Processing),
        delivery_status: Set(DeliveryStatus::Pending),
        payment_status: Set(new.payment_status),
        payment_id: Set(new.payment_id),
        checkout_session_id: Set(new.checkout_session_id),
        sub_total_amt: Set(new.sub_total_amt),
        total_amt: Set(new.total_amt),
        delivery_person_id: Set(None),
        delivery_person_name: Set(None),
        assigned_at: Set(None),
        delivered_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(new.lines.len());
    for (position, line) in new.lines.into_iter().enumerate() {
        let item = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            position: Set(position as i32),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            product_details: Set(serde_json::to_value(&line.snapshot)?),
            line_total: Set(line.line_total),
        }
        .insert(conn)
        .await?;

        cart_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            user_id: Set(new.user_id),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        items.push(item);
    }

    OrderResponse::from_parts(order, items)
}

/// Attaches items to a batch of orders, preserving the batch order
pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderResponse>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
    for item in order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .order_by_asc(order_item::Column::Position)
        .all(conn)
        .await?
    {
        grouped.entry(item.order_id).or_default().push(item);
    }

    orders
        .into_iter()
        .map(|order| {
            let items = grouped.remove(&order.id).unwrap_or_default();
            OrderResponse::from_parts(order, items)
        })
        .collect()
}

/// Resolves an order by internal UUID or by its `ORD-…` number
pub(crate) async fn find_order<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> Result<order::Model, ServiceError> {
    let key = key.trim();
    let query = match Uuid::parse_str(key) {
        Ok(id) => order::Entity::find_by_id(id),
        Err(_) => order::Entity::find().filter(order::Column::OrderId.eq(key)),
    };
    query
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", key)))
}

/// Prices cart lines against live products
fn price_cart_lines(
    lines: &[(cart_item::Model, Option<product::Model>)],
) -> Result<(Vec<NewOrderLine>, Decimal, Decimal), ServiceError> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut sub_total = Decimal::ZERO;
    let mut total = Decimal::ZERO;

    for (item, product) in lines {
        let product = product.as_ref().ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "Product {} in cart is no longer available",
                item.product_id
            ))
        })?;
        let quantity = Decimal::from(item.quantity);
        let line_total = price_with_discount(product.price, product.discount) * quantity;

        sub_total += product.price * quantity;
        total += line_total;
        priced.push(NewOrderLine {
            product_id: product.id,
            quantity: item.quantity,
            snapshot: ProductSnapshot::from_product(product),
            line_total,
        });
    }

    Ok((priced, sub_total, total))
}

/// Order creation and customer-facing order reads
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Turns the caller's cart into one cash-on-delivery order.
    ///
    /// Reads the cart, writes the order, items and history, and deletes the
    /// cart lines in a single transaction. If another checkout removed any of
    /// the loaded lines first, the transaction is abandoned with a conflict.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_cash_on_delivery(
        &self,
        user_id: Uuid,
        request: CashOnDeliveryRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let started = Instant::now();
        let txn = self.db.begin().await?;

        let address = address::Entity::find_by_id(request.delivery_address_id)
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::Status.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Address {} not found",
                    request.delivery_address_id
                ))
            })?;

        let lines = CartService::load_lines(&txn, user_id).await?;
        if lines.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let (priced, computed_sub_total, computed_total) = price_cart_lines(&lines)?;
        let (sub_total_amt, total_amt) = if self.config.trust_client_totals {
            (
                request.sub_total_amt.unwrap_or(computed_sub_total),
                request.total_amt.unwrap_or(computed_total),
            )
        } else {
            if request.total_amt.is_some_and(|t| t != computed_total)
                || request.sub_total_amt.is_some_and(|t| t != computed_sub_total)
            {
                warn!(
                    client_total = ?request.total_amt,
                    %computed_total,
                    "ignoring client-supplied totals"
                );
            }
            (computed_sub_total, computed_total)
        };

        let order = insert_order(
            &txn,
            NewOrder {
                user_id,
                delivery_address_id: address.id,
                payment_status: PaymentStatus::CashOnDelivery,
                payment_id: None,
                checkout_session_id: None,
                sub_total_amt,
                total_amt,
                lines: priced,
            },
        )
        .await?;

        let line_ids: Vec<Uuid> = lines.iter().map(|(item, _)| item.id).collect();
        let deleted = cart_item::Entity::delete_many()
            .filter(cart_item::Column::Id.is_in(line_ids.clone()))
            .exec(&txn)
            .await?
            .rows_affected;
        if deleted != line_ids.len() as u64 {
            warn!(
                expected = line_ids.len(),
                deleted, "cart changed during checkout, rolling back"
            );
            counter!("orders.checkout_conflicts", 1);
            txn.rollback().await?;
            return Err(ServiceError::Conflict(
                "Cart was modified by another checkout".to_string(),
            ));
        }

        txn.commit().await?;

        counter!("orders.created", 1, "source" => "cash_on_delivery");
        histogram!("orders.create_duration", started.elapsed());
        info!(order_id = %order.order_id, items = order.items.len(), "cash-on-delivery order created");

        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id: order.id,
                order_number: order.order_id.clone(),
                user_id,
                total_amt: order.total_amt,
                source: OrderSource::CashOnDelivery,
            })
            .await;
        self.event_sender
            .send_or_log(Event::CartCleared {
                user_id,
                lines: deleted,
            })
            .await;

        Ok(order)
    }

    /// The caller's orders, newest first
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        with_items(&*self.db, orders).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(price: Decimal, discount: Decimal) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: "Toor Dal".into(),
            image: serde_json::json!(["https://img/dal.png"]),
            unit: "1 kg".into(),
            stock: 10,
            price,
            discount,
            description: String::new(),
            more_details: serde_json::json!({}),
            publish: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product: &product::Model, quantity: i32) -> (cart_item::Model, Option<product::Model>) {
        (
            cart_item::Model {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                product_id: product.id,
                quantity,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            Some(product.clone()),
        )
    }

    #[test]
    fn totals_use_discounted_unit_price() {
        let rice = product(dec!(100), dec!(10));
        let oil = product(dec!(101), dec!(3));
        let (lines, sub_total, total) =
            price_cart_lines(&[line(&rice, 2), line(&oil, 1)]).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total, dec!(180));
        assert_eq!(lines[1].line_total, dec!(97));
        assert_eq!(sub_total, dec!(301));
        assert_eq!(total, dec!(277));
        assert_eq!(lines[0].snapshot.name, "Toor Dal");
        assert_eq!(lines[0].snapshot.image, vec!["https://img/dal.png".to_string()]);
    }

    #[test]
    fn missing_product_fails_pricing() {
        let rice = product(dec!(10), dec!(0));
        let (item, _) = line(&rice, 1);
        assert!(matches!(
            price_cart_lines(&[(item, None)]),
            Err(ServiceError::InvalidOperation(_))
        ));
    }
}
