use crate::{
    entities::{cart_item, product},
    errors::ServiceError,
    models::price_with_discount,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn default_quantity() -> i32 {
    1
}

/// Largest quantity a single cart line may hold
pub const MAX_LINE_QUANTITY: i32 = 1000;

/// Input for adding a product to the cart
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddToCartInput {
    #[serde(alias = "productId")]
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

/// Input for changing a line's quantity; zero removes the line
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCartQuantityInput {
    #[serde(alias = "_id", alias = "cartItemId")]
    pub id: Uuid,
    #[validate(range(min = 0, max = 1000))]
    pub quantity: i32,
}

/// A cart line with the live product it points at
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub name: String,
    pub image: Vec<String>,
    pub unit: String,
    pub price: Decimal,
    pub discount: Decimal,
    /// Price after discount
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLineView>,
    pub total_quantity: i64,
    /// Sum of list prices
    pub sub_total: Decimal,
    /// Sum of discounted prices
    pub total: Decimal,
}

/// Cart store: one row per (user, product)
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Cart lines joined with their products, oldest first.
    ///
    /// Generic over the connection so order creation can read inside its transaction.
    pub(crate) async fn load_lines<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Vec<(cart_item::Model, Option<product::Model>)>, ServiceError> {
        Ok(cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .order_by_asc(cart_item::Column::Id)
            .find_also_related(product::Entity)
            .all(conn)
            .await?)
    }

    /// Adds a product, or increments the quantity when it is already in the cart
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<cart_item::Model, ServiceError> {
        input.validate()?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;
        if !product.publish {
            return Err(ServiceError::InvalidOperation(format!(
                "Product {} is not available",
                product.id
            )));
        }

        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&*self.db)
            .await?;

        let now = Utc::now();
        let line = match existing {
            Some(item) => {
                let quantity = item.quantity + input.quantity;
                if quantity > MAX_LINE_QUANTITY {
                    return Err(ServiceError::ValidationError(format!(
                        "quantity must not exceed {MAX_LINE_QUANTITY}"
                    )));
                }
                let mut item: cart_item::ActiveModel = item.into();
                item.quantity = Set(quantity);
                item.updated_at = Set(now);
                item.update(&*self.db).await?
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(input.product_id),
                    quantity: Set(input.quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&*self.db)
                .await?
            }
        };

        info!(cart_item_id = %line.id, quantity = line.quantity, "cart line saved");
        Ok(line)
    }

    /// Current cart with live prices
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartSummary, ServiceError> {
        let lines = Self::load_lines(&*self.db, user_id).await?;

        let items: Vec<CartLineView> = lines
            .into_iter()
            .filter_map(|(item, product)| product.map(|p| (item, p)))
            .map(|(item, product)| {
                let unit_price = price_with_discount(product.price, product.discount);
                CartLineView {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    image: product.images(),
                    name: product.name,
                    unit: product.unit,
                    price: product.price,
                    discount: product.discount,
                    unit_price,
                    line_total: unit_price * Decimal::from(item.quantity),
                }
            })
            .collect();

        let sub_total = items
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();
        let total = items.iter().map(|l| l.line_total).sum();
        let total_quantity = items.iter().map(|l| i64::from(l.quantity)).sum();

        Ok(CartSummary {
            items,
            total_quantity,
            sub_total,
            total,
        })
    }

    /// Sets a line's quantity. Returns `None` when quantity zero removed the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: Uuid,
        input: UpdateCartQuantityInput,
    ) -> Result<Option<cart_item::Model>, ServiceError> {
        input.validate()?;
        let item = self.owned_line(user_id, input.id).await?;

        if input.quantity == 0 {
            cart_item::Entity::delete_by_id(item.id)
                .exec(&*self.db)
                .await?;
            return Ok(None);
        }

        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(input.quantity);
        item.updated_at = Set(Utc::now());
        Ok(Some(item.update(&*self.db).await?))
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, cart_item_id: Uuid) -> Result<(), ServiceError> {
        let item = self.owned_line(user_id, cart_item_id).await?;
        cart_item::Entity::delete_by_id(item.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn owned_line(
        &self,
        user_id: Uuid,
        cart_item_id: Uuid,
    ) -> Result<cart_item::Model, ServiceError> {
        cart_item::Entity::find_by_id(cart_item_id)
            .filter(cart_item::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", cart_item_id)))
    }
}
