use crate::models::{DeliveryStatus, OrderStatus, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placed order. `order_id` is the customer-facing number; `id` is internal.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_id: String,
    pub user_id: Uuid,
    pub delivery_address_id: Uuid,
    pub order_status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub payment_status: PaymentStatus,
    #[sea_orm(nullable)]
    pub payment_id: Option<String>,
    #[sea_orm(nullable)]
    pub checkout_session_id: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub sub_total_amt: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amt: Decimal,
    #[sea_orm(nullable)]
    pub delivery_person_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub delivery_person_name: Option<String>,
    #[sea_orm(nullable)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
    #[sea_orm(has_many = "super::cart_history::Entity")]
    CartHistory,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::DeliveryAddressId",
        to = "super::address::Column::Id"
    )]
    Address,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::cart_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartHistory.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
