//! Vehicle repository.
//!
//! Every mutation commits together with its audit entry.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{fuel_requests, vehicle_types, vehicles};
use crate::repositories::action_log::{record_in, RecordActionInput};

/// Vehicle operation errors.
#[derive(Debug, Error)]
pub enum VehicleError {
    /// Plate number already registered.
    #[error("plate number already registered: {0}")]
    PlateTaken(String),

    /// Vehicle not found.
    #[error("vehicle not found: {0}")]
    NotFound(Uuid),

    /// Referenced vehicle type does not exist.
    #[error("vehicle type not found: {0}")]
    UnknownType(Uuid),

    /// Fuel requests still reference this vehicle.
    #[error("vehicle {0} has fuel requests and can only be deactivated")]
    HasRequests(Uuid),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),
}

/// Input for registering a vehicle.
#[derive(Debug, Clone)]
pub struct CreateVehicleInput {
    /// Plate number, unique.
    pub plate_number: String,
    /// Vehicle type.
    pub vehicle_type_id: Uuid,
    /// Optional model name.
    pub model: Option<String>,
    /// Optional model year.
    pub year: Option<i32>,
}

/// Input for updating a vehicle. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateVehicleInput {
    /// New plate number.
    pub plate_number: Option<String>,
    /// New vehicle type.
    pub vehicle_type_id: Option<Uuid>,
    /// New model name.
    pub model: Option<Option<String>>,
    /// New model year.
    pub year: Option<Option<i32>>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
}

/// Vehicle repository.
#[derive(Debug, Clone)]
pub struct VehicleRepository {
    db: DatabaseConnection,
}

impl VehicleRepository {
    /// Creates a new vehicle repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a vehicle on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `VehicleError::PlateTaken` or `VehicleError::UnknownType`
    /// on referential failures.
    pub async fn create(
        &self,
        actor_id: Uuid,
        input: CreateVehicleInput,
    ) -> Result<vehicles::Model, VehicleError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        let clash = vehicles::Entity::find()
            .filter(vehicles::Column::PlateNumber.eq(&input.plate_number))
            .one(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;
        if clash.is_some() {
            return Err(VehicleError::PlateTaken(input.plate_number));
        }

        let type_exists = vehicle_types::Entity::find_by_id(input.vehicle_type_id)
            .one(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;
        if type_exists.is_none() {
            return Err(VehicleError::UnknownType(input.vehicle_type_id));
        }

        let now = Utc::now().into();
        let model = vehicles::ActiveModel {
            id: Set(Uuid::new_v4()),
            plate_number: Set(input.plate_number),
            vehicle_type_id: Set(input.vehicle_type_id),
            model: Set(input.model),
            year: Set(input.year),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let vehicle = model
            .insert(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "vehicle.created".to_string(),
                entity_type: "vehicle".to_string(),
                entity_id: vehicle.id,
                detail: Some(json!({
                    "plate_number": vehicle.plate_number,
                    "vehicle_type_id": vehicle.vehicle_type_id,
                })),
            },
        )
        .await
        .map_err(|e| VehicleError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        Ok(vehicle)
    }

    /// Finds a vehicle by ID.
    ///
    /// # Errors
    ///
    /// Returns `VehicleError::Database` on store failure.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<vehicles::Model>, VehicleError> {
        vehicles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))
    }

    /// Lists vehicles, optionally only active ones, by plate number.
    ///
    /// # Errors
    ///
    /// Returns `VehicleError::Database` on store failure.
    pub async fn list(&self, active_only: bool) -> Result<Vec<vehicles::Model>, VehicleError> {
        let mut query = vehicles::Entity::find().order_by_asc(vehicles::Column::PlateNumber);
        if active_only {
            query = query.filter(vehicles::Column::IsActive.eq(true));
        }
        query
            .all(&self.db)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))
    }

    /// Updates a vehicle on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `VehicleError::NotFound`, `PlateTaken`, or `UnknownType`
    /// on referential failures.
    pub async fn update(
        &self,
        actor_id: Uuid,
        id: Uuid,
        input: UpdateVehicleInput,
    ) -> Result<vehicles::Model, VehicleError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        let model = vehicles::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?
            .ok_or(VehicleError::NotFound(id))?;

        if let Some(plate) = &input.plate_number {
            let clash = vehicles::Entity::find()
                .filter(vehicles::Column::PlateNumber.eq(plate))
                .filter(vehicles::Column::Id.ne(id))
                .one(&txn)
                .await
                .map_err(|e| VehicleError::Database(e.to_string()))?;
            if clash.is_some() {
                return Err(VehicleError::PlateTaken(plate.clone()));
            }
        }

        if let Some(type_id) = input.vehicle_type_id {
            let exists = vehicle_types::Entity::find_by_id(type_id)
                .one(&txn)
                .await
                .map_err(|e| VehicleError::Database(e.to_string()))?;
            if exists.is_none() {
                return Err(VehicleError::UnknownType(type_id));
            }
        }

        let detail = json!({
            "plate_number": input.plate_number,
            "vehicle_type_id": input.vehicle_type_id,
            "is_active": input.is_active,
        });

        let mut active: vehicles::ActiveModel = model.into();
        if let Some(plate) = input.plate_number {
            active.plate_number = Set(plate);
        }
        if let Some(type_id) = input.vehicle_type_id {
            active.vehicle_type_id = Set(type_id);
        }
        if let Some(model_name) = input.model {
            active.model = Set(model_name);
        }
        if let Some(year) = input.year {
            active.year = Set(year);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let vehicle = active
            .update(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "vehicle.updated".to_string(),
                entity_type: "vehicle".to_string(),
                entity_id: id,
                detail: Some(detail),
            },
        )
        .await
        .map_err(|e| VehicleError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        Ok(vehicle)
    }

    /// Deletes a vehicle with no fuel-request history, on behalf of
    /// `actor_id`.
    ///
    /// Vehicles that appear in requests are part of the audit trail and
    /// can only be deactivated.
    ///
    /// # Errors
    ///
    /// Returns `VehicleError::HasRequests` when history exists.
    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> Result<(), VehicleError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        let model = vehicles::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?
            .ok_or(VehicleError::NotFound(id))?;

        let referenced = fuel_requests::Entity::find()
            .filter(fuel_requests::Column::VehicleId.eq(id))
            .count(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;
        if referenced > 0 {
            return Err(VehicleError::HasRequests(id));
        }

        let plate_number = model.plate_number.clone();
        model
            .delete(&txn)
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "vehicle.deleted".to_string(),
                entity_type: "vehicle".to_string(),
                entity_id: id,
                detail: Some(json!({ "plate_number": plate_number })),
            },
        )
        .await
        .map_err(|e| VehicleError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| VehicleError::Database(e.to_string()))?;

        Ok(())
    }
}
