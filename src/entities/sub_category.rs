use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sub_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub image: String,
    /// JSON array of parent category ids
    #[sea_orm(column_type = "Json")]
    pub category_ids: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn parent_ids(&self) -> Vec<Uuid> {
        serde_json::from_value(self.category_ids.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_sub_category::Entity")]
    ProductSubCategory,
}

impl Related<super::product_sub_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSubCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
