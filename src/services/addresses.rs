use crate::{entities::address, errors::ServiceError};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateAddressInput {
    #[validate(length(min = 1, max = 500))]
    pub address_line: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 3, max = 12))]
    pub pincode: String,
    #[validate(length(min = 6, max = 20))]
    pub mobile: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateAddressInput {
    #[serde(alias = "_id")]
    pub id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub address_line: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[validate(length(min = 3, max = 12))]
    pub pincode: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub mobile: Option<String>,
}

/// Delivery addresses with soft delete
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateAddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let model = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            address_line: Set(input.address_line),
            city: Set(input.city),
            state: Set(input.state),
            country: Set(input.country),
            pincode: Set(input.pincode),
            mobile: Set(input.mobile),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(address_id = %model.id, "address created");
        Ok(model)
    }

    /// Active addresses only
    #[instrument(skip(self))]
    pub async fn list_active(&self, user_id: Uuid) -> Result<Vec<address::Model>, ServiceError> {
        Ok(address::Entity::find()
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::Status.eq(true))
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Any address the user owns, disabled ones included
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<address::Model, ServiceError> {
        address::Entity::find_by_id(id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: Uuid,
        input: UpdateAddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(user_id, input.id).await?;
        if !existing.status {
            return Err(ServiceError::NotFound(format!(
                "Address {} not found",
                input.id
            )));
        }

        let mut model: address::ActiveModel = existing.into();
        if let Some(v) = input.address_line {
            model.address_line = Set(v);
        }
        if let Some(v) = input.city {
            model.city = Set(v);
        }
        if let Some(v) = input.state {
            model.state = Set(v);
        }
        if let Some(v) = input.country {
            model.country = Set(v);
        }
        if let Some(v) = input.pincode {
            model.pincode = Set(v);
        }
        if let Some(v) = input.mobile {
            model.mobile = Set(v);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    /// Soft delete: the row stays so existing orders keep resolving it
    #[instrument(skip(self))]
    pub async fn disable(&self, user_id: Uuid, id: Uuid) -> Result<address::Model, ServiceError> {
        let existing = self.get(user_id, id).await?;
        if !existing.status {
            return Ok(existing);
        }
        let mut model: address::ActiveModel = existing.into();
        model.status = Set(false);
        model.updated_at = Set(Utc::now());
        let model = model.update(&*self.db).await?;
        info!(address_id = %model.id, "address disabled");
        Ok(model)
    }
}
