//! User repository for identity management.
//!
//! Every mutation commits together with its audit entry, so the action
//! log never disagrees with the users table.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use fuelflow_core::workflow::Role;

use crate::entities::{sea_orm_active_enums::UserRole, users};
use crate::repositories::action_log::{record_in, RecordActionInput};

/// Identity operation errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email already registered.
    #[error("email already registered: {0}")]
    EmailTaken(String),

    /// User not found.
    #[error("user not found: {0}")]
    NotFound(Uuid),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Email address, unique.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Role in the organization.
    pub role: Role,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Input for updating a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name.
    pub display_name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// Activate or deactivate the account.
    pub is_active: Option<bool>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user account.
    ///
    /// Registration is self-service, so the audit entry is attributed to
    /// the account being created.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmailTaken` when the email is already
    /// registered, or `IdentityError::Database` on store failure.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, IdentityError> {
        if self.find_by_email(&input.email).await?.is_some() {
            return Err(IdentityError::EmailTaken(input.email));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?;

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email.to_lowercase()),
            display_name: Set(input.display_name),
            role: Set(UserRole::from(input.role)),
            password_hash: Set(input.password_hash),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let user = user
            .insert(&txn)
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id: user.id,
                action: "user.registered".to_string(),
                entity_type: "user".to_string(),
                entity_id: user.id,
                detail: Some(json!({
                    "email": user.email,
                    "role": Role::from(user.role.clone()).as_str(),
                })),
            },
        )
        .await
        .map_err(|e| IdentityError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Database` on store failure.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, IdentityError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))
    }

    /// Finds a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Database` on store failure.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, IdentityError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))
    }

    /// Lists all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Database` on store failure.
    pub async fn list(&self) -> Result<Vec<users::Model>, IdentityError> {
        users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))
    }

    /// Updates a user's profile fields on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NotFound` if the user does not exist.
    pub async fn update(
        &self,
        actor_id: Uuid,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, IdentityError> {
        self.apply(actor_id, id, input, "user.updated").await
    }

    /// Deactivates a user account on behalf of `actor_id`.
    ///
    /// Accounts are never deleted: their requests and decisions stay part
    /// of the audit trail.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NotFound` if the user does not exist.
    pub async fn deactivate(&self, actor_id: Uuid, id: Uuid) -> Result<users::Model, IdentityError> {
        self.apply(
            actor_id,
            id,
            UpdateUserInput {
                is_active: Some(false),
                ..UpdateUserInput::default()
            },
            "user.deactivated",
        )
        .await
    }

    async fn apply(
        &self,
        actor_id: Uuid,
        id: Uuid,
        input: UpdateUserInput,
        action: &str,
    ) -> Result<users::Model, IdentityError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?;

        let user = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?
            .ok_or(IdentityError::NotFound(id))?;

        let detail = json!({
            "display_name": input.display_name,
            "role": input.role.map(|r| r.as_str()),
            "is_active": input.is_active,
        });

        let mut active: users::ActiveModel = user.into();
        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(role) = input.role {
            active.role = Set(UserRole::from(role));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let user = active
            .update(&txn)
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: action.to_string(),
                entity_type: "user".to_string(),
                entity_id: id,
                detail: Some(detail),
            },
        )
        .await
        .map_err(|e| IdentityError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| IdentityError::Database(e.to_string()))?;

        Ok(user)
    }
}
