//! Order and courier status vocabularies and the moves allowed between them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of an order as seen by the shop.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Processing")]
    #[serde(rename = "Processing")]
    #[strum(serialize = "Processing")]
    Processing,
    #[sea_orm(string_value = "Ready for Dispatch")]
    #[serde(rename = "Ready for Dispatch")]
    #[strum(serialize = "Ready for Dispatch")]
    ReadyForDispatch,
    #[sea_orm(string_value = "Out for Delivery")]
    #[serde(rename = "Out for Delivery")]
    #[strum(serialize = "Out for Delivery")]
    OutForDelivery,
    #[sea_orm(string_value = "Delivered")]
    #[serde(rename = "Delivered")]
    #[strum(serialize = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Failed Delivery")]
    #[serde(rename = "Failed Delivery")]
    #[strum(serialize = "Failed Delivery")]
    FailedDelivery,
    #[sea_orm(string_value = "Returned")]
    #[serde(rename = "Returned")]
    #[strum(serialize = "Returned")]
    Returned,
    #[sea_orm(string_value = "Cancelled")]
    #[serde(rename = "Cancelled")]
    #[strum(serialize = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Position on the happy path, `None` for the side exits.
    fn rank(self) -> Option<u8> {
        match self {
            Self::Processing => Some(0),
            Self::ReadyForDispatch => Some(1),
            Self::OutForDelivery => Some(2),
            Self::Delivered => Some(3),
            Self::FailedDelivery | Self::Returned | Self::Cancelled => None,
        }
    }

    /// Whether `next` may follow `self`. Re-setting the current value counts as allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self == next {
            return true;
        }
        match next {
            Self::Cancelled => matches!(self, Self::Processing | Self::ReadyForDispatch),
            Self::FailedDelivery => self == Self::OutForDelivery,
            Self::Returned => matches!(self, Self::Delivered | Self::FailedDelivery),
            _ => match (self.rank(), next.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    /// No courier can be attached to an order in one of these states.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::FailedDelivery | Self::Returned | Self::Cancelled
        )
    }
}

/// Courier-facing progress of a single delivery.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "Pending")]
    #[serde(rename = "Pending")]
    #[strum(serialize = "Pending")]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    #[serde(rename = "Accepted")]
    #[strum(serialize = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rejected")]
    #[serde(rename = "Rejected")]
    #[strum(serialize = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "On the way to pickup")]
    #[serde(rename = "On the way to pickup")]
    #[strum(serialize = "On the way to pickup")]
    OnTheWayToPickup,
    #[sea_orm(string_value = "Arrived at pickup")]
    #[serde(rename = "Arrived at pickup")]
    #[strum(serialize = "Arrived at pickup")]
    ArrivedAtPickup,
    #[sea_orm(string_value = "Picked up")]
    #[serde(rename = "Picked up")]
    #[strum(serialize = "Picked up")]
    PickedUp,
    #[sea_orm(string_value = "On the way to customer")]
    #[serde(rename = "On the way to customer")]
    #[strum(serialize = "On the way to customer")]
    OnTheWayToCustomer,
    #[sea_orm(string_value = "Arrived at customer")]
    #[serde(rename = "Arrived at customer")]
    #[strum(serialize = "Arrived at customer")]
    ArrivedAtCustomer,
    #[sea_orm(string_value = "Delivered successfully")]
    #[serde(rename = "Delivered successfully")]
    #[strum(serialize = "Delivered successfully")]
    DeliveredSuccessfully,
    #[sea_orm(string_value = "Failed delivery")]
    #[serde(rename = "Failed delivery")]
    #[strum(serialize = "Failed delivery")]
    FailedDelivery,
    #[sea_orm(string_value = "Return to seller")]
    #[serde(rename = "Return to seller")]
    #[strum(serialize = "Return to seller")]
    ReturnToSeller,
}

impl DeliveryStatus {
    fn rank(self) -> Option<u8> {
        match self {
            Self::Accepted => Some(0),
            Self::OnTheWayToPickup => Some(1),
            Self::ArrivedAtPickup => Some(2),
            Self::PickedUp => Some(3),
            Self::OnTheWayToCustomer => Some(4),
            Self::ArrivedAtCustomer => Some(5),
            Self::DeliveredSuccessfully => Some(6),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected
                | Self::DeliveredSuccessfully
                | Self::FailedDelivery
                | Self::ReturnToSeller
        )
    }

    /// Whether a courier may move a delivery from `self` to `next`.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Self::Pending, Self::Accepted | Self::Rejected) => true,
            (Self::Pending, _) => false,
            (_, Self::FailedDelivery | Self::ReturnToSeller) => true,
            (from, to) => match (from.rank(), to.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    /// Order status implied by reaching this courier state, if any.
    pub fn implied_order_status(self) -> Option<OrderStatus> {
        match self {
            Self::PickedUp | Self::OnTheWayToCustomer | Self::ArrivedAtCustomer => {
                Some(OrderStatus::OutForDelivery)
            }
            Self::DeliveredSuccessfully => Some(OrderStatus::Delivered),
            Self::FailedDelivery => Some(OrderStatus::FailedDelivery),
            Self::ReturnToSeller => Some(OrderStatus::Returned),
            _ => None,
        }
    }
}

/// How (and whether) an order has been paid for.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "CASH ON DELIVERY")]
    #[serde(rename = "CASH ON DELIVERY")]
    #[strum(serialize = "CASH ON DELIVERY")]
    CashOnDelivery,
    #[sea_orm(string_value = "PAID")]
    #[serde(rename = "PAID")]
    #[strum(serialize = "PAID")]
    Paid,
    #[sea_orm(string_value = "UNPAID")]
    #[serde(rename = "UNPAID")]
    #[strum(serialize = "UNPAID")]
    Unpaid,
}

impl PaymentStatus {
    /// Maps a hosted-checkout `payment_status` string.
    pub fn from_gateway(value: &str) -> Self {
        match value {
            "paid" | "no_payment_required" => Self::Paid,
            _ => Self::Unpaid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OrderStatus::Processing, OrderStatus::ReadyForDispatch, true)]
    #[case(OrderStatus::Processing, OrderStatus::OutForDelivery, true)]
    #[case(OrderStatus::ReadyForDispatch, OrderStatus::OutForDelivery, true)]
    #[case(OrderStatus::OutForDelivery, OrderStatus::Delivered, true)]
    #[case(OrderStatus::OutForDelivery, OrderStatus::FailedDelivery, true)]
    #[case(OrderStatus::Delivered, OrderStatus::Returned, true)]
    #[case(OrderStatus::FailedDelivery, OrderStatus::Returned, true)]
    #[case(OrderStatus::Processing, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::ReadyForDispatch, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Delivered, OrderStatus::Delivered, true)]
    #[case(OrderStatus::Delivered, OrderStatus::Processing, false)]
    #[case(OrderStatus::OutForDelivery, OrderStatus::ReadyForDispatch, false)]
    #[case(OrderStatus::OutForDelivery, OrderStatus::Cancelled, false)]
    #[case(OrderStatus::Processing, OrderStatus::FailedDelivery, false)]
    #[case(OrderStatus::Processing, OrderStatus::Returned, false)]
    #[case(OrderStatus::Cancelled, OrderStatus::Processing, false)]
    #[case(OrderStatus::Returned, OrderStatus::Delivered, false)]
    fn order_status_transitions(
        #[case] from: OrderStatus,
        #[case] to: OrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
    }

    #[rstest]
    #[case(DeliveryStatus::Pending, DeliveryStatus::Accepted, true)]
    #[case(DeliveryStatus::Pending, DeliveryStatus::Rejected, true)]
    #[case(DeliveryStatus::Pending, DeliveryStatus::PickedUp, false)]
    #[case(DeliveryStatus::Pending, DeliveryStatus::FailedDelivery, false)]
    #[case(DeliveryStatus::Accepted, DeliveryStatus::OnTheWayToPickup, true)]
    #[case(DeliveryStatus::ArrivedAtPickup, DeliveryStatus::PickedUp, true)]
    #[case(DeliveryStatus::PickedUp, DeliveryStatus::ArrivedAtPickup, false)]
    #[case(DeliveryStatus::ArrivedAtCustomer, DeliveryStatus::DeliveredSuccessfully, true)]
    #[case(DeliveryStatus::OnTheWayToCustomer, DeliveryStatus::FailedDelivery, true)]
    #[case(DeliveryStatus::Accepted, DeliveryStatus::ReturnToSeller, true)]
    #[case(DeliveryStatus::DeliveredSuccessfully, DeliveryStatus::ReturnToSeller, false)]
    #[case(DeliveryStatus::Rejected, DeliveryStatus::Accepted, false)]
    fn delivery_status_transitions(
        #[case] from: DeliveryStatus,
        #[case] to: DeliveryStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
    }

    #[test]
    fn courier_states_imply_order_states() {
        assert_eq!(
            DeliveryStatus::PickedUp.implied_order_status(),
            Some(OrderStatus::OutForDelivery)
        );
        assert_eq!(
            DeliveryStatus::DeliveredSuccessfully.implied_order_status(),
            Some(OrderStatus::Delivered)
        );
        assert_eq!(
            DeliveryStatus::ReturnToSeller.implied_order_status(),
            Some(OrderStatus::Returned)
        );
        assert_eq!(DeliveryStatus::Accepted.implied_order_status(), None);
    }

    #[test]
    fn wire_names_match_display() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::CashOnDelivery).unwrap(),
            "\"CASH ON DELIVERY\""
        );
        assert_eq!(OrderStatus::ReadyForDispatch.to_string(), "Ready for Dispatch");
        let parsed: DeliveryStatus = serde_json::from_str("\"Picked up\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::PickedUp);
    }

    #[test]
    fn closed_orders() {
        assert!(!OrderStatus::Processing.is_closed());
        assert!(!OrderStatus::OutForDelivery.is_closed());
        assert!(OrderStatus::Cancelled.is_closed());
        assert!(OrderStatus::Delivered.is_closed());
    }

    #[test]
    fn gateway_payment_status() {
        assert_eq!(PaymentStatus::from_gateway("paid"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_gateway("unpaid"), PaymentStatus::Unpaid);
    }
}
