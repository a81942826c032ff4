//! Vehicle type catalog routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser, middleware::auth::unknown_role_response};
use fuelflow_core::workflow::ApprovalEngine;
use fuelflow_db::VehicleTypeRepository;
use fuelflow_db::entities::vehicle_types;
use fuelflow_db::repositories::vehicle_type::{
    CreateVehicleTypeInput, UpdateVehicleTypeInput, VehicleTypeError,
};

/// Creates the vehicle types router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicle-types", post(create_type))
        .route("/vehicle-types", get(list_types))
        .route("/vehicle-types/{type_id}", get(get_type))
        .route("/vehicle-types/{type_id}", patch(update_type))
        .route("/vehicle-types/{type_id}", delete(delete_type))
}

/// Request body for creating a vehicle type.
#[derive(Debug, Deserialize)]
pub struct CreateTypeBody {
    /// Type name, unique.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional reference consumption threshold, liters per 100 km.
    #[serde(default)]
    pub consumption_threshold: Option<Decimal>,
}

/// Request body for updating a vehicle type.
#[derive(Debug, Deserialize)]
pub struct UpdateTypeBody {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New consumption threshold.
    #[serde(default, deserialize_with = "double_option")]
    pub consumption_threshold: Option<Option<Decimal>>,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

fn type_json(vehicle_type: &vehicle_types::Model) -> serde_json::Value {
    json!({
        "id": vehicle_type.id,
        "name": vehicle_type.name,
        "description": vehicle_type.description,
        "consumption_threshold": vehicle_type.consumption_threshold,
        "created_at": vehicle_type.created_at,
        "updated_at": vehicle_type.updated_at
    })
}

fn type_error_response(err: &VehicleTypeError) -> Response {
    let (status, code) = match err {
        VehicleTypeError::NameTaken(_) => (StatusCode::CONFLICT, "name_taken"),
        VehicleTypeError::NotFound(_) => (StatusCode::NOT_FOUND, "vehicle_type_not_found"),
        VehicleTypeError::InUse(_) => (StatusCode::CONFLICT, "vehicle_type_in_use"),
        VehicleTypeError::Database(_) => {
            error!(error = %err, "Database error in vehicle type operation");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    (
        status,
        Json(json!({ "error": code, "message": err.to_string() })),
    )
        .into_response()
}

fn manage_gate(auth: &AuthUser) -> Option<Response> {
    let Some(role) = auth.role() else {
        return Some(unknown_role_response());
    };
    if ApprovalEngine::can_manage_vehicle_types(role) {
        None
    } else {
        Some(
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "Only admins may manage vehicle types"
                })),
            )
                .into_response(),
        )
    }
}

/// POST /vehicle-types - Create a vehicle type.
async fn create_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTypeBody>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = VehicleTypeRepository::new((*state.db).clone());
    match repo
        .create(auth.user_id(), CreateVehicleTypeInput {
            name: payload.name,
            description: payload.description,
            consumption_threshold: payload.consumption_threshold,
        })
        .await
    {
        Ok(vehicle_type) => {
            info!(type_id = %vehicle_type.id, name = %vehicle_type.name, "Vehicle type created");
            (StatusCode::CREATED, Json(type_json(&vehicle_type))).into_response()
        }
        Err(e) => type_error_response(&e),
    }
}

/// GET /vehicle-types - List vehicle types.
async fn list_types(State(state): State<AppState>, _auth: AuthUser) -> impl IntoResponse {
    let repo = VehicleTypeRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(types) => {
            let items: Vec<_> = types.iter().map(type_json).collect();
            (StatusCode::OK, Json(json!({ "vehicle_types": items }))).into_response()
        }
        Err(e) => type_error_response(&e),
    }
}

/// GET `/vehicle-types/{type_id}` - Vehicle type detail.
async fn get_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(type_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = VehicleTypeRepository::new((*state.db).clone());
    match repo.find_by_id(type_id).await {
        Ok(Some(vehicle_type)) => {
            (StatusCode::OK, Json(type_json(&vehicle_type))).into_response()
        }
        Ok(None) => type_error_response(&VehicleTypeError::NotFound(type_id)),
        Err(e) => type_error_response(&e),
    }
}

/// PATCH `/vehicle-types/{type_id}` - Update a vehicle type.
async fn update_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(type_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateTypeBody>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = VehicleTypeRepository::new((*state.db).clone());
    match repo
        .update(
            auth.user_id(),
            type_id,
            UpdateVehicleTypeInput {
                name: payload.name,
                description: payload.description,
                consumption_threshold: payload.consumption_threshold,
            },
        )
        .await
    {
        Ok(vehicle_type) => {
            info!(type_id = %type_id, "Vehicle type updated");
            (StatusCode::OK, Json(type_json(&vehicle_type))).into_response()
        }
        Err(e) => type_error_response(&e),
    }
}

/// DELETE `/vehicle-types/{type_id}` - Delete an unused vehicle type.
async fn delete_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(type_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = VehicleTypeRepository::new((*state.db).clone());
    match repo.delete(auth.user_id(), type_id).await {
        Ok(()) => {
            info!(type_id = %type_id, deleted_by = %auth.user_id(), "Vehicle type deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => type_error_response(&e),
    }
}
