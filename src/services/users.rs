use crate::{
    auth::{hash_password, verify_password, AuthError, AuthService, TokenPair},
    config::AppConfig,
    entities::user::{self, UserRole},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 6, max = 20))]
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateRoleInput {
    #[serde(alias = "userId", alias = "_id")]
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Account as exposed over the API; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub role: UserRole,
    pub status: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            mobile: model.mobile,
            role: model.role,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Accounts, credentials and roles
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: Arc<AuthService>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            auth,
            event_sender,
            config,
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<UserView, ServiceError> {
        input.validate()?;
        let email = normalize_email(&input.email);

        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Email {} is already registered",
                email
            )));
        }

        let role = match self.config.bootstrap_admin_email.as_deref() {
            Some(admin) if normalize_email(admin) == email => UserRole::Admin,
            _ => UserRole::User,
        };

        let now = Utc::now();
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(email),
            password_hash: Set(hash_password(&input.password)?),
            mobile: Set(input.mobile),
            role: Set(role),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %created.id, %role, "user registered");
        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        Ok(created.into())
    }

    /// Checks credentials and issues a token pair
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse, ServiceError> {
        input.validate()?;
        let email = normalize_email(&input.email);

        let Some(account) = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?
        else {
            warn!("login for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(&input.password, &account.password_hash)? {
            warn!(user_id = %account.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !account.status {
            return Err(AuthError::AccountDisabled.into());
        }

        let tokens = self.auth.generate_token(&account)?;
        info!(user_id = %account.id, "user logged in");
        Ok(LoginResponse {
            user: account.into(),
            tokens,
        })
    }

    pub async fn user_details(&self, user_id: Uuid) -> Result<UserView, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .map(UserView::from)
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    /// Admin role change. An admin cannot change their own role.
    #[instrument(skip(self))]
    pub async fn update_role(
        &self,
        acting_admin: Uuid,
        input: UpdateRoleInput,
    ) -> Result<UserView, ServiceError> {
        if input.user_id == acting_admin {
            return Err(ServiceError::InvalidOperation(
                "Admins cannot change their own role".to_string(),
            ));
        }

        let existing = user::Entity::find_by_id(input.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", input.user_id)))?;
        if existing.role == input.role {
            return Ok(existing.into());
        }

        let previous = existing.role;
        let mut model: user::ActiveModel = existing.into();
        model.role = Set(input.role);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        info!(user_id = %updated.id, from = %previous, to = %updated.role, "user role changed");
        Ok(updated.into())
    }

    /// Active accounts with the DELIVERY role, by name
    pub async fn delivery_users(&self) -> Result<Vec<UserView>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Delivery))
            .filter(user::Column::Status.eq(true))
            .order_by_asc(user::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(UserView::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn register_input_rejects_short_password() {
        let input = RegisterInput {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password: "short".into(),
            mobile: None,
        };
        assert!(input.validate().is_err());
    }
}
