//! Vehicle type repository.
//!
//! Every mutation commits together with its audit entry.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{vehicle_types, vehicles};
use crate::repositories::action_log::{record_in, RecordActionInput};

/// Vehicle type operation errors.
#[derive(Debug, Error)]
pub enum VehicleTypeError {
    /// Name already in use.
    #[error("vehicle type name already in use: {0}")]
    NameTaken(String),

    /// Vehicle type not found.
    #[error("vehicle type not found: {0}")]
    NotFound(Uuid),

    /// Vehicles still reference this type.
    #[error("vehicle type {0} is still in use")]
    InUse(Uuid),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),
}

/// Input for creating a vehicle type.
#[derive(Debug, Clone)]
pub struct CreateVehicleTypeInput {
    /// Type name, unique.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional reference consumption threshold, liters per 100 km.
    pub consumption_threshold: Option<Decimal>,
}

/// Input for updating a vehicle type. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateVehicleTypeInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New consumption threshold.
    pub consumption_threshold: Option<Option<Decimal>>,
}

/// Vehicle type repository.
#[derive(Debug, Clone)]
pub struct VehicleTypeRepository {
    db: DatabaseConnection,
}

impl VehicleTypeRepository {
    /// Creates a new vehicle type repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a vehicle type on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `VehicleTypeError::NameTaken` when the name is in use.
    pub async fn create(
        &self,
        actor_id: Uuid,
        input: CreateVehicleTypeInput,
    ) -> Result<vehicle_types::Model, VehicleTypeError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        let existing = vehicle_types::Entity::find()
            .filter(vehicle_types::Column::Name.eq(&input.name))
            .one(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(VehicleTypeError::NameTaken(input.name));
        }

        let now = Utc::now().into();
        let model = vehicle_types::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            consumption_threshold: Set(input.consumption_threshold),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let vehicle_type = model
            .insert(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "vehicle_type.created".to_string(),
                entity_type: "vehicle_type".to_string(),
                entity_id: vehicle_type.id,
                detail: Some(json!({ "name": vehicle_type.name })),
            },
        )
        .await
        .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        Ok(vehicle_type)
    }

    /// Finds a vehicle type by ID.
    ///
    /// # Errors
    ///
    /// Returns `VehicleTypeError::Database` on store failure.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<vehicle_types::Model>, VehicleTypeError> {
        vehicle_types::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))
    }

    /// Lists all vehicle types by name.
    ///
    /// # Errors
    ///
    /// Returns `VehicleTypeError::Database` on store failure.
    pub async fn list(&self) -> Result<Vec<vehicle_types::Model>, VehicleTypeError> {
        vehicle_types::Entity::find()
            .order_by_asc(vehicle_types::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))
    }

    /// Updates a vehicle type on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `VehicleTypeError::NotFound` if absent, `NameTaken` if the
    /// new name collides with another type.
    pub async fn update(
        &self,
        actor_id: Uuid,
        id: Uuid,
        input: UpdateVehicleTypeInput,
    ) -> Result<vehicle_types::Model, VehicleTypeError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        let model = vehicle_types::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?
            .ok_or(VehicleTypeError::NotFound(id))?;

        if let Some(name) = &input.name {
            let clash = vehicle_types::Entity::find()
                .filter(vehicle_types::Column::Name.eq(name))
                .filter(vehicle_types::Column::Id.ne(id))
                .one(&txn)
                .await
                .map_err(|e| VehicleTypeError::Database(e.to_string()))?;
            if clash.is_some() {
                return Err(VehicleTypeError::NameTaken(name.clone()));
            }
        }

        let detail = json!({
            "name": input.name,
            "consumption_threshold": input.consumption_threshold,
        });

        let mut active: vehicle_types::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(threshold) = input.consumption_threshold {
            active.consumption_threshold = Set(threshold);
        }
        active.updated_at = Set(Utc::now().into());

        let vehicle_type = active
            .update(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "vehicle_type.updated".to_string(),
                entity_type: "vehicle_type".to_string(),
                entity_id: id,
                detail: Some(detail),
            },
        )
        .await
        .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        Ok(vehicle_type)
    }

    /// Deletes a vehicle type that no vehicle references, on behalf of
    /// `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `VehicleTypeError::InUse` when vehicles still reference it.
    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> Result<(), VehicleTypeError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        let model = vehicle_types::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?
            .ok_or(VehicleTypeError::NotFound(id))?;

        let in_use = vehicles::Entity::find()
            .filter(vehicles::Column::VehicleTypeId.eq(id))
            .count(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;
        if in_use > 0 {
            return Err(VehicleTypeError::InUse(id));
        }

        let name = model.name.clone();
        model
            .delete(&txn)
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "vehicle_type.deleted".to_string(),
                entity_type: "vehicle_type".to_string(),
                entity_id: id,
                detail: Some(json!({ "name": name })),
            },
        )
        .await
        .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| VehicleTypeError::Database(e.to_string()))?;

        Ok(())
    }
}
