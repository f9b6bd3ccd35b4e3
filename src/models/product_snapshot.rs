use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Free-form product attributes ("Shelf life" -> "6 months").
pub type MoreDetails = BTreeMap<String, String>;

/// Product fields frozen onto an order line when the order is placed.
///
/// Later catalog edits never change what an existing order shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductSnapshot {
    pub name: String,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub unit: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
}

impl ProductSnapshot {
    pub fn from_product(product: &crate::entities::product::Model) -> Self {
        Self {
            name: product.name.clone(),
            image: product.images(),
            unit: product.unit.clone(),
            price: product.price,
            discount: product.discount,
        }
    }
}
