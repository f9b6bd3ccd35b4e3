//! Categories, sub-categories and products.

use crate::{
    config::AppConfig,
    entities::{cart_item, category, product, product_category, product_sub_category, sub_category},
    errors::ServiceError,
    models::{
        pricing::{MAX_UNIT_PRICE, MONEY_SCALE},
        price_with_discount, MoreDetails,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 1024))]
    pub image: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategoryInput {
    #[serde(alias = "_id", alias = "categoryId")]
    pub id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateSubCategoryInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 1024))]
    pub image: String,
    #[serde(alias = "category", alias = "categoryIds")]
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateSubCategoryInput {
    #[serde(alias = "_id", alias = "subCategoryId")]
    pub id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub image: Option<String>,
    #[serde(default, alias = "category", alias = "categoryIds")]
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubCategoryView {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub category_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<sub_category::Model> for SubCategoryView {
    fn from(model: sub_category::Model) -> Self {
        Self {
            category_ids: model.parent_ids(),
            id: model.id,
            name: model.name,
            image: model.image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default, alias = "category", alias = "categoryIds")]
    pub category_ids: Vec<Uuid>,
    #[serde(default, alias = "subCategory", alias = "subCategoryIds")]
    pub sub_category_ids: Vec<Uuid>,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub unit: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub description: String,
    /// Object of string values
    #[serde(default, alias = "moreDetails")]
    #[schema(value_type = Object)]
    pub more_details: Value,
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[serde(alias = "_id", alias = "productId")]
    pub id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub image: Option<Vec<String>>,
    #[serde(default, alias = "category", alias = "categoryIds")]
    pub category_ids: Option<Vec<Uuid>>,
    #[serde(default, alias = "subCategory", alias = "subCategoryIds")]
    pub sub_category_ids: Option<Vec<Uuid>>,
    #[validate(length(max = 60))]
    pub unit: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub description: Option<String>,
    #[serde(default, alias = "moreDetails")]
    #[schema(value_type = Option<Object>)]
    pub more_details: Option<Value>,
    pub publish: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches name or description
    pub search: Option<String>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<Uuid>,
    #[serde(alias = "subCategoryId")]
    pub sub_category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub image: Vec<String>,
    pub category_ids: Vec<Uuid>,
    pub sub_category_ids: Vec<Uuid>,
    pub unit: String,
    pub stock: i32,
    pub price: Decimal,
    pub discount: Decimal,
    /// Price after discount
    pub unit_price: Decimal,
    pub description: String,
    pub more_details: MoreDetails,
    pub publish: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    fn new(model: product::Model, category_ids: Vec<Uuid>, sub_category_ids: Vec<Uuid>) -> Self {
        Self {
            image: model.images(),
            more_details: model.more_details_map(),
            unit_price: price_with_discount(model.price, model.discount),
            category_ids,
            sub_category_ids,
            id: model.id,
            name: model.name,
            unit: model.unit,
            stock: model.stock,
            price: model.price,
            discount: model.discount,
            description: model.description,
            publish: model.publish,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub items: Vec<ProductView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Accepts `null` or an object whose values are all strings.
pub fn parse_more_details(value: Value) -> Result<MoreDetails, ServiceError> {
    match value {
        Value::Null => Ok(MoreDetails::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => Ok((key, s)),
                _ => Err(ServiceError::ValidationError(format!(
                    "more_details.{key} must be a string"
                ))),
            })
            .collect(),
        _ => Err(ServiceError::ValidationError(
            "more_details must be an object of strings".to_string(),
        )),
    }
}

fn check_pricing(price: Decimal, discount: Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError("price must not be negative".into()));
    }
    if price > MAX_UNIT_PRICE {
        return Err(ServiceError::ValidationError(format!(
            "price must not exceed {MAX_UNIT_PRICE}"
        )));
    }
    if price.normalize().scale() > MONEY_SCALE {
        return Err(ServiceError::ValidationError(format!(
            "price must have at most {MONEY_SCALE} decimal places"
        )));
    }
    if discount < Decimal::ZERO || discount > HUNDRED {
        return Err(ServiceError::ValidationError(
            "discount must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    // Categories

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            image: Set(input.image),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        info!(category_id = %created.id, "category created");
        Ok(created)
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let existing = category::Entity::find_by_id(input.id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", input.id)))?;

        let mut model: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(image) = input.image {
            model.image = Set(image);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    /// Refuses while any product or sub-category still points at the category
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        category::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))?;

        let products = product_category::Entity::find()
            .filter(product_category::Column::CategoryId.eq(id))
            .count(db)
            .await?;
        let sub_categories = sub_category::Entity::find()
            .all(db)
            .await?
            .iter()
            .filter(|s| s.parent_ids().contains(&id))
            .count();
        if products > 0 || sub_categories > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Category is used by {} products and {} sub-categories",
                products, sub_categories
            )));
        }

        category::Entity::delete_by_id(id).exec(db).await?;
        info!(category_id = %id, "category deleted");
        Ok(())
    }

    // Sub-categories

    #[instrument(skip(self))]
    pub async fn create_sub_category(
        &self,
        input: CreateSubCategoryInput,
    ) -> Result<SubCategoryView, ServiceError> {
        input.validate()?;
        let category_ids = dedup(input.category_ids);
        ensure_categories_exist(&*self.db, &category_ids).await?;

        let now = Utc::now();
        let created = sub_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            image: Set(input.image),
            category_ids: Set(serde_json::to_value(&category_ids)?),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        info!(sub_category_id = %created.id, "sub-category created");
        Ok(created.into())
    }

    pub async fn list_sub_categories(&self) -> Result<Vec<SubCategoryView>, ServiceError> {
        Ok(sub_category::Entity::find()
            .order_by_asc(sub_category::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(SubCategoryView::from)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn update_sub_category(
        &self,
        input: UpdateSubCategoryInput,
    ) -> Result<SubCategoryView, ServiceError> {
        input.validate()?;
        let existing = sub_category::Entity::find_by_id(input.id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Sub-category {} not found", input.id))
            })?;

        let mut model: sub_category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(image) = input.image {
            model.image = Set(image);
        }
        if let Some(ids) = input.category_ids {
            let ids = dedup(ids);
            ensure_categories_exist(&*self.db, &ids).await?;
            model.category_ids = Set(serde_json::to_value(&ids)?);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_sub_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        sub_category::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sub-category {} not found", id)))?;

        let products = product_sub_category::Entity::find()
            .filter(product_sub_category::Column::SubCategoryId.eq(id))
            .count(db)
            .await?;
        if products > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Sub-category is used by {} products",
                products
            )));
        }

        sub_category::Entity::delete_by_id(id).exec(db).await?;
        info!(sub_category_id = %id, "sub-category deleted");
        Ok(())
    }

    // Products

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: CreateProductInput) -> Result<ProductView, ServiceError> {
        input.validate()?;
        check_pricing(input.price, input.discount)?;
        let more_details = parse_more_details(input.more_details)?;
        let category_ids = dedup(input.category_ids);
        let sub_category_ids = dedup(input.sub_category_ids);

        let txn = self.db.begin().await?;
        ensure_categories_exist(&txn, &category_ids).await?;
        ensure_sub_categories_exist(&txn, &sub_category_ids).await?;

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            image: Set(serde_json::to_value(&input.image)?),
            unit: Set(input.unit),
            stock: Set(input.stock),
            price: Set(input.price),
            discount: Set(input.discount),
            description: Set(input.description),
            more_details: Set(serde_json::to_value(&more_details)?),
            publish: Set(input.publish),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        replace_memberships(&txn, created.id, Some(&category_ids), Some(&sub_category_ids)).await?;
        txn.commit().await?;

        info!(product_id = %created.id, "product created");
        Ok(ProductView::new(created, category_ids, sub_category_ids))
    }

    /// Published products, newest first
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ServiceError> {
        let db = &*self.db;
        let page = query.page.unwrap_or(1).max(1);
        let limit = self.config.page_size(query.limit);

        let mut select = product::Entity::find().filter(product::Column::Publish.eq(true));
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(product::Column::Name.contains(search))
                    .add(product::Column::Description.contains(search)),
            );
        }
        if let Some(category_id) = query.category_id {
            let ids: Vec<Uuid> = product_category::Entity::find()
                .filter(product_category::Column::CategoryId.eq(category_id))
                .all(db)
                .await?
                .into_iter()
                .map(|m| m.product_id)
                .collect();
            select = select.filter(product::Column::Id.is_in(ids));
        }
        if let Some(sub_category_id) = query.sub_category_id {
            let ids: Vec<Uuid> = product_sub_category::Entity::find()
                .filter(product_sub_category::Column::SubCategoryId.eq(sub_category_id))
                .all(db)
                .await?
                .into_iter()
                .map(|m| m.product_id)
                .collect();
            select = select.filter(product::Column::Id.is_in(ids));
        }

        let paginator = select
            .order_by_desc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            items: with_memberships(db, products).await?,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// A single published product
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductView, ServiceError> {
        let product = product::Entity::find_by_id(id)
            .filter(product::Column::Publish.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
        let mut views = with_memberships(&*self.db, vec![product]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self, input), fields(product_id = %input.id))]
    pub async fn update_product(&self, input: UpdateProductInput) -> Result<ProductView, ServiceError> {
        input.validate()?;
        let more_details = input.more_details.map(parse_more_details).transpose()?;
        let category_ids = input.category_ids.map(dedup);
        let sub_category_ids = input.sub_category_ids.map(dedup);

        let txn = self.db.begin().await?;
        let existing = product::Entity::find_by_id(input.id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", input.id)))?;
        check_pricing(
            input.price.unwrap_or(existing.price),
            input.discount.unwrap_or(existing.discount),
        )?;
        if let Some(ids) = &category_ids {
            ensure_categories_exist(&txn, ids).await?;
        }
        if let Some(ids) = &sub_category_ids {
            ensure_sub_categories_exist(&txn, ids).await?;
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(image) = input.image {
            model.image = Set(serde_json::to_value(image)?);
        }
        if let Some(unit) = input.unit {
            model.unit = Set(unit);
        }
        if let Some(stock) = input.stock {
            model.stock = Set(stock);
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(discount) = input.discount {
            model.discount = Set(discount);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(details) = more_details {
            model.more_details = Set(serde_json::to_value(details)?);
        }
        if let Some(publish) = input.publish {
            model.publish = Set(publish);
        }
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        replace_memberships(
            &txn,
            updated.id,
            category_ids.as_deref(),
            sub_category_ids.as_deref(),
        )
        .await?;
        let mut views = with_memberships(&txn, vec![updated]).await?;
        txn.commit().await?;

        views
            .pop()
            .ok_or_else(|| ServiceError::InternalError("updated product not found".into()))
    }

    /// Removes the product along with its memberships and any cart lines.
    /// Existing orders keep their snapshots.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let deleted = product::Entity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Product {} not found", id)));
        }
        product_category::Entity::delete_many()
            .filter(product_category::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        product_sub_category::Entity::delete_many()
            .filter(product_sub_category::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        let carts = cart_item::Entity::delete_many()
            .filter(cart_item::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(product_id = %id, cart_lines = carts.rows_affected, "product deleted");
        Ok(())
    }
}

async fn ensure_categories_exist<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> Result<(), ServiceError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = category::Entity::find()
        .filter(category::Column::Id.is_in(ids.to_vec()))
        .count(conn)
        .await?;
    if found != ids.len() as u64 {
        return Err(ServiceError::ValidationError("unknown category id".into()));
    }
    Ok(())
}

async fn ensure_sub_categories_exist<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<(), ServiceError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = sub_category::Entity::find()
        .filter(sub_category::Column::Id.is_in(ids.to_vec()))
        .count(conn)
        .await?;
    if found != ids.len() as u64 {
        return Err(ServiceError::ValidationError("unknown sub-category id".into()));
    }
    Ok(())
}

/// Rewrites the join rows that are given; `None` leaves a set untouched
async fn replace_memberships<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    category_ids: Option<&[Uuid]>,
    sub_category_ids: Option<&[Uuid]>,
) -> Result<(), ServiceError> {
    if let Some(ids) = category_ids {
        product_category::Entity::delete_many()
            .filter(product_category::Column::ProductId.eq(product_id))
            .exec(conn)
            .await?;
        for id in ids {
            product_category::ActiveModel {
                product_id: Set(product_id),
                category_id: Set(*id),
            }
            .insert(conn)
            .await?;
        }
    }
    if let Some(ids) = sub_category_ids {
        product_sub_category::Entity::delete_many()
            .filter(product_sub_category::Column::ProductId.eq(product_id))
            .exec(conn)
            .await?;
        for id in ids {
            product_sub_category::ActiveModel {
                product_id: Set(product_id),
                sub_category_id: Set(*id),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

async fn with_memberships<C: ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductView>, ServiceError> {
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut categories: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut sub_categories: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

    if !ids.is_empty() {
        for row in product_category::Entity::find()
            .filter(product_category::Column::ProductId.is_in(ids.clone()))
            .all(conn)
            .await?
        {
            categories.entry(row.product_id).or_default().push(row.category_id);
        }
        for row in product_sub_category::Entity::find()
            .filter(product_sub_category::Column::ProductId.is_in(ids))
            .all(conn)
            .await?
        {
            sub_categories
                .entry(row.product_id)
                .or_default()
                .push(row.sub_category_id);
        }
    }

    Ok(products
        .into_iter()
        .map(|p| {
            let c = categories.remove(&p.id).unwrap_or_default();
            let s = sub_categories.remove(&p.id).unwrap_or_default();
            ProductView::new(p, c, s)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn more_details_accepts_string_map_and_null() {
        let parsed = parse_more_details(json!({"Shelf life": "6 months", "Origin": "Punjab"})).unwrap();
        assert_eq!(parsed.get("Origin").map(String::as_str), Some("Punjab"));
        assert!(parse_more_details(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn more_details_rejects_other_shapes() {
        assert_matches!(
            parse_more_details(json!({"weight": 5})),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            parse_more_details(json!(["a", "b"])),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn pricing_bounds() {
        assert!(check_pricing(dec!(10), dec!(0)).is_ok());
        assert!(check_pricing(dec!(10), dec!(100)).is_ok());
        assert!(check_pricing(dec!(-1), dec!(0)).is_err());
        assert!(check_pricing(dec!(10), dec!(101)).is_err());
        assert!(check_pricing(MAX_UNIT_PRICE, dec!(0)).is_ok());
        assert_matches!(
            check_pricing(Decimal::MAX, dec!(50)),
            Err(ServiceError::ValidationError(_))
        );
        assert!(check_pricing(dec!(10.12345), dec!(0)).is_err());
    }
}
