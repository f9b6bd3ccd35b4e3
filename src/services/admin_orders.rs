use crate::{
    config::AppConfig,
    entities::order,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderStatus, PaymentStatus},
    services::orders::{find_order, with_items, OrderResponse},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

/// Filters for the admin order list
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AdminOrderQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(alias = "orderStatus")]
    pub order_status: Option<OrderStatus>,
    #[serde(alias = "paymentStatus")]
    pub payment_status: Option<PaymentStatus>,
    /// Substring of the `ORD-…` order number
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[serde(alias = "orderId", alias = "_id")]
    pub order_id: String,
    #[serde(alias = "orderStatus", alias = "status")]
    pub order_status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderPage {
    pub items: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Moves `current` to `next` on the active model, stamping `delivered_at`
/// when the order becomes Delivered.
pub(crate) fn apply_order_status(
    model: &mut order::ActiveModel,
    current: OrderStatus,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if !current.can_transition_to(next) {
        return Err(ServiceError::InvalidStatus(format!(
            "Cannot move order from {} to {}",
            current, next
        )));
    }
    model.order_status = Set(next);
    if next == OrderStatus::Delivered && current != OrderStatus::Delivered {
        model.delivered_at = Set(Some(now));
    }
    Ok(())
}

/// Admin-only order operations
#[derive(Clone)]
pub struct AdminOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl AdminOrderService {
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

    #[instrument(skip(self))]
    pub async fn list(&self, query: AdminOrderQuery) -> Result<OrderPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = self.config.page_size(query.limit);

        let mut select = order::Entity::find();
        if let Some(status) = query.order_status {
            select = select.filter(order::Column::OrderStatus.eq(status));
        }
        if let Some(status) = query.payment_status {
            select = select.filter(order::Column::PaymentStatus.eq(status));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(order::Column::OrderId.contains(search.to_ascii_uppercase()));
        }

        let paginator = select
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(OrderPage {
            items: with_items(&*self.db, orders).await?,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Sets `order_status`, enforcing the forward-only lifecycle
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_key: &str,
        next: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let existing = find_order(&*self.db, order_key).await?;
        let current = existing.order_status;
        if current == next {
            return single(with_items(&*self.db, vec![existing]).await?);
        }

        let now = Utc::now();
        let mut model: order::ActiveModel = existing.into();
        apply_order_status(&mut model, current, next, now)?;
        model.updated_at = Set(now);
        let updated = model.update(&*self.db).await?;

        info!(order_id = %updated.order_id, from = %current, to = %next, "order status updated");
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: updated.id,
                old_status: current,
                new_status: next,
            })
            .await;

        single(with_items(&*self.db, vec![updated]).await?)
    }

    /// Orders with no courier that are still open
    pub async fn awaiting_assignment(&self) -> Result<u64, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::DeliveryPersonId.is_null())
            .filter(order::Column::OrderStatus.is_in([
                OrderStatus::Processing,
                OrderStatus::ReadyForDispatch,
            ]))
            .count(&*self.db)
            .await?)
    }
}

pub(crate) fn single(mut orders: Vec<OrderResponse>) -> Result<OrderResponse, ServiceError> {
    orders
        .pop()
        .ok_or_else(|| ServiceError::InternalError("order vanished while loading items".into()))
}
