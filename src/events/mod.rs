use crate::models::{DeliveryStatus, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Events are emitted after commit, so a closed channel must not fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "dropping domain event");
        }
    }
}

/// Where an order came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSource {
    CashOnDelivery,
    HostedCheckout,
}

// Domain events emitted after the owning transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        order_number: String,
        user_id: Uuid,
        total_amt: Decimal,
        source: OrderSource,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    DeliveryAssigned {
        order_id: Uuid,
        delivery_person_id: Uuid,
    },
    DeliveryStatusChanged {
        order_id: Uuid,
        old_status: DeliveryStatus,
        new_status: DeliveryStatus,
    },
    CheckoutSessionCreated {
        user_id: Uuid,
        session_id: String,
    },
    PaymentConfirmed {
        event_id: String,
        session_id: String,
        orders_created: usize,
    },
    CartCleared {
        user_id: Uuid,
        lines: u64,
    },
    UserRegistered(Uuid),
}

/// Drain the event channel, logging every event. Returns when all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                order_number,
                user_id,
                total_amt,
                source,
            } => info!(
                %order_id,
                order_number = %order_number,
                %user_id,
                total_amt = %total_amt,
                source = ?source,
                "order created"
            ),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(%order_id, from = %old_status, to = %new_status, "order status changed"),
            Event::DeliveryAssigned {
                order_id,
                delivery_person_id,
            } => info!(%order_id, %delivery_person_id, "delivery assigned"),
            Event::DeliveryStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(%order_id, from = %old_status, to = %new_status, "delivery status changed"),
            Event::CheckoutSessionCreated {
                user_id,
                session_id,
            } => info!(%user_id, session_id = %session_id, "checkout session created"),
            Event::PaymentConfirmed {
                event_id,
                session_id,
                orders_created,
            } => info!(
                event_id = %event_id,
                session_id = %session_id,
                orders_created,
                "payment confirmed"
            ),
            Event::CartCleared { user_id, lines } => info!(%user_id, lines, "cart cleared"),
            Event::UserRegistered(user_id) => info!(%user_id, "user registered"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_after_consumer_exits_is_logged_not_failed() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        drop(rx);
        assert!(sender.send(Event::UserRegistered(Uuid::new_v4())).await.is_err());
        sender
            .send_or_log(Event::UserRegistered(Uuid::new_v4()))
            .await;
    }

    #[tokio::test]
    async fn loop_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::CartCleared {
                user_id: Uuid::new_v4(),
                lines: 2,
            })
            .await
            .unwrap();
        drop(sender);
        process_events(rx).await;
    }
}
