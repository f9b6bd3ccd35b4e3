use crate::{
    auth::AuthUser,
    entities::{
        order,
        user::{self, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::DeliveryStatus,
    services::{
        admin_orders::{apply_order_status, single},
        orders::{find_order, with_items, OrderResponse},
    },
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AssignDeliveryRequest {
    #[serde(alias = "orderId", alias = "_id")]
    pub order_id: String,
    #[serde(alias = "deliveryPersonId", alias = "deliveryPerson")]
    pub delivery_person_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateDeliveryStatusRequest {
    #[serde(alias = "orderId", alias = "_id")]
    pub order_id: String,
    #[serde(alias = "deliveryStatus", alias = "status")]
    pub delivery_status: DeliveryStatus,
}

/// Courier assignment and courier-driven progress
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Hands an order to a courier.
    ///
    /// Replaces any previous assignee and restarts courier progress at
    /// Pending. Orders that are already closed cannot be assigned.
    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        order_key: &str,
        delivery_person_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let courier = user::Entity::find_by_id(delivery_person_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("User {} not found", delivery_person_id))
            })?;
        if courier.role != UserRole::Delivery {
            return Err(ServiceError::InvalidOperation(format!(
                "User {} is not a delivery person",
                delivery_person_id
            )));
        }
        if !courier.status {
            return Err(ServiceError::InvalidOperation(format!(
                "Delivery person {} is disabled",
                delivery_person_id
            )));
        }

        let existing = find_order(&*self.db, order_key).await?;
        if existing.order_status.is_closed() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is {} and cannot be assigned",
                existing.order_id, existing.order_status
            )));
        }
        if let Some(previous) = existing.delivery_person_id.filter(|p| *p != courier.id) {
            info!(%previous, "replacing previous courier");
        }

        let now = Utc::now();
        let mut model: order::ActiveModel = existing.into();
        model.delivery_person_id = Set(Some(courier.id));
        model.delivery_person_name = Set(Some(courier.name.clone()));
        model.delivery_status = Set(DeliveryStatus::Pending);
        model.assigned_at = Set(Some(now));
        model.updated_at = Set(now);
        let updated = model.update(&*self.db).await?;

        info!(order_id = %updated.order_id, courier = %courier.id, "delivery assigned");
        self.event_sender
            .send_or_log(Event::DeliveryAssigned {
                order_id: updated.id,
                delivery_person_id: courier.id,
            })
            .await;

        single(with_items(&*self.db, vec![updated]).await?)
    }

    /// Orders currently assigned to the courier, most recently assigned first
    #[instrument(skip(self))]
    pub async fn my_assigned_orders(
        &self,
        delivery_person_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::DeliveryPersonId.eq(delivery_person_id))
            .order_by_desc(order::Column::AssignedAt)
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        with_items(&*self.db, orders).await
    }

    /// Courier progress update. Only the assigned courier may call this; the
    /// order status follows along when the implied move is allowed.
    #[instrument(skip(self, courier), fields(courier = %courier.user_id))]
    pub async fn update_delivery_status(
        &self,
        courier: &AuthUser,
        order_key: &str,
        next: DeliveryStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let existing = find_order(&*self.db, order_key).await?;
        if existing.delivery_person_id != Some(courier.user_id) {
            return Err(ServiceError::Forbidden(
                "Order is not assigned to you".to_string(),
            ));
        }

        let current = existing.delivery_status;
        if current == next {
            return single(with_items(&*self.db, vec![existing]).await?);
        }
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move delivery from {} to {}",
                current, next
            )));
        }

        let order_status = existing.order_status;
        let now = Utc::now();
        let mut model: order::ActiveModel = existing.into();
        model.delivery_status = Set(next);

        let mut mirrored = None;
        if let Some(implied) = next.implied_order_status() {
            if implied != order_status {
                match apply_order_status(&mut model, order_status, implied, now) {
                    Ok(()) => mirrored = Some(implied),
                    Err(_) => warn!(
                        from = %order_status,
                        to = %implied,
                        "order status not mirrored from delivery update"
                    ),
                }
            }
        }
        model.updated_at = Set(now);
        let updated = model.update(&*self.db).await?;

        info!(order_id = %updated.order_id, from = %current, to = %next, "delivery status updated");
        self.event_sender
            .send_or_log(Event::DeliveryStatusChanged {
                order_id: updated.id,
                old_status: current,
                new_status: next,
            })
            .await;
        if let Some(new_status) = mirrored {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: updated.id,
                    old_status: order_status,
                    new_status,
                })
                .await;
        }

        single(with_items(&*self.db, vec![updated]).await?)
    }
}
