use crate::{
    entities::{order, order_item},
    errors::ServiceError,
    models::OrderStatus,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

const TOP_PRODUCTS: usize = 5;

/// Admin dashboard aggregates
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardReport {
    pub total_orders: u64,
    /// Sum of `total_amt` over orders that were not cancelled
    pub total_revenue: Decimal,
    pub orders_by_status: BTreeMap<String, u64>,
    pub top_products: Vec<TopProduct>,
    /// Open orders with no courier
    pub awaiting_assignment: u64,
}

/// Best seller by quantity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

/// Read-only aggregates over orders
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardReport, ServiceError> {
        let db = &*self.db;
        let orders: Vec<(Uuid, OrderStatus, Decimal, Option<Uuid>)> = order::Entity::find()
            .select_only()
            .column(order::Column::Id)
            .column(order::Column::OrderStatus)
            .column(order::Column::TotalAmt)
            .column(order::Column::DeliveryPersonId)
            .into_tuple()
            .all(db)
            .await?;

        let mut total_revenue = Decimal::ZERO;
        let mut orders_by_status: BTreeMap<String, u64> = BTreeMap::new();
        let mut awaiting_assignment = 0;
        let mut counted: HashSet<Uuid> = HashSet::new();

        for (id, status, total_amt, courier) in &orders {
            *orders_by_status.entry(status.to_string()).or_insert(0) += 1;
            if *status != OrderStatus::Cancelled {
                total_revenue += *total_amt;
                counted.insert(*id);
            }
            if courier.is_none()
                && matches!(status, OrderStatus::Processing | OrderStatus::ReadyForDispatch)
            {
                awaiting_assignment += 1;
            }
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(counted.iter().copied().collect::<Vec<_>>()))
            .all(db)
            .await?;

        Ok(DashboardReport {
            total_orders: orders.len() as u64,
            total_revenue,
            orders_by_status,
            top_products: top_products(&items, TOP_PRODUCTS),
            awaiting_assignment,
        })
    }
}

fn top_products(items: &[order_item::Model], limit: usize) -> Vec<TopProduct> {
    let mut by_product: HashMap<Uuid, TopProduct> = HashMap::new();
    for item in items {
        let entry = by_product.entry(item.product_id).or_insert_with(|| TopProduct {
            product_id: item.product_id,
            name: item.snapshot().map(|s| s.name).unwrap_or_default(),
            quantity_sold: 0,
            revenue: Decimal::ZERO,
        });
        entry.quantity_sold += i64::from(item.quantity);
        entry.revenue += item.line_total;
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: Uuid, name: &str, quantity: i32) -> order_item::Model {
        order_item::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            position: 0,
            product_id,
            quantity,
            product_details: serde_json::json!({
                "name": name, "image": [], "unit": "1 kg", "price": "10", "discount": "0"
            }),
            line_total: Decimal::from(quantity) * dec!(10),
        }
    }

    #[test]
    fn ranks_products_by_quantity() {
        let rice = Uuid::new_v4();
        let dal = Uuid::new_v4();
        let items = vec![item(rice, "Rice", 2), item(dal, "Dal", 1), item(rice, "Rice", 3)];

        let ranked = top_products(&items, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].product_id, rice);
        assert_eq!(ranked[0].quantity_sold, 5);
        assert_eq!(ranked[0].revenue, dec!(50));
        assert_eq!(ranked[0].name, "Rice");
    }
}
