//! Vehicle fleet management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser, middleware::auth::unknown_role_response};
use fuelflow_core::workflow::ApprovalEngine;
use fuelflow_db::VehicleRepository;
use fuelflow_db::entities::vehicles;
use fuelflow_db::repositories::vehicle::{
    CreateVehicleInput, UpdateVehicleInput, VehicleError,
};

/// Creates the vehicles router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", post(create_vehicle))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/{vehicle_id}", get(get_vehicle))
        .route("/vehicles/{vehicle_id}", patch(update_vehicle))
        .route("/vehicles/{vehicle_id}", delete(delete_vehicle))
}

/// Request body for registering a vehicle.
#[derive(Debug, Deserialize)]
pub struct CreateVehicleBody {
    /// Plate number, unique.
    pub plate_number: String,
    /// Vehicle type ID.
    pub vehicle_type_id: uuid::Uuid,
    /// Optional model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Optional model year.
    #[serde(default)]
    pub year: Option<i32>,
}

/// Request body for updating a vehicle.
///
/// Nullable fields use a double `Option`: absent means unchanged, `null`
/// clears the value.
#[derive(Debug, Deserialize)]
pub struct UpdateVehicleBody {
    /// New plate number.
    #[serde(default)]
    pub plate_number: Option<String>,
    /// New vehicle type.
    #[serde(default)]
    pub vehicle_type_id: Option<uuid::Uuid>,
    /// New model name.
    #[serde(default, deserialize_with = "double_option")]
    pub model: Option<Option<String>>,
    /// New model year.
    #[serde(default, deserialize_with = "double_option")]
    pub year: Option<Option<i32>>,
    /// Activate or deactivate.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Query parameters for listing vehicles.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// When true, only active vehicles are returned.
    #[serde(default)]
    pub active_only: bool,
}

fn vehicle_json(vehicle: &vehicles::Model) -> serde_json::Value {
    json!({
        "id": vehicle.id,
        "plate_number": vehicle.plate_number,
        "vehicle_type_id": vehicle.vehicle_type_id,
        "model": vehicle.model,
        "year": vehicle.year,
        "is_active": vehicle.is_active,
        "created_at": vehicle.created_at,
        "updated_at": vehicle.updated_at
    })
}

fn vehicle_error_response(err: &VehicleError) -> Response {
    let (status, code) = match err {
        VehicleError::PlateTaken(_) => (StatusCode::CONFLICT, "plate_taken"),
        VehicleError::NotFound(_) => (StatusCode::NOT_FOUND, "vehicle_not_found"),
        VehicleError::UnknownType(_) => (StatusCode::BAD_REQUEST, "unknown_vehicle_type"),
        VehicleError::HasRequests(_) => (StatusCode::CONFLICT, "vehicle_has_requests"),
        VehicleError::Database(_) => {
            error!(error = %err, "Database error in vehicle operation");
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
    if ApprovalEngine::can_manage_vehicles(role) {
        None
    } else {
        Some(
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "Only admins and directors may manage vehicles"
                })),
            )
                .into_response(),
        )
    }
}

/// POST /vehicles - Register a vehicle.
async fn create_vehicle(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateVehicleBody>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = VehicleRepository::new((*state.db).clone());
    match repo
        .create(auth.user_id(), CreateVehicleInput {
            plate_number: payload.plate_number,
            vehicle_type_id: payload.vehicle_type_id,
            model: payload.model,
            year: payload.year,
        })
        .await
    {
        Ok(vehicle) => {
            info!(vehicle_id = %vehicle.id, plate = %vehicle.plate_number, "Vehicle registered");
            (StatusCode::CREATED, Json(vehicle_json(&vehicle))).into_response()
        }
        Err(e) => vehicle_error_response(&e),
    }
}

/// GET /vehicles - List vehicles.
async fn list_vehicles(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let repo = VehicleRepository::new((*state.db).clone());
    match repo.list(query.active_only).await {
        Ok(vehicles) => {
            let items: Vec<_> = vehicles.iter().map(vehicle_json).collect();
            (StatusCode::OK, Json(json!({ "vehicles": items }))).into_response()
        }
        Err(e) => vehicle_error_response(&e),
    }
}

/// GET `/vehicles/{vehicle_id}` - Vehicle detail.
async fn get_vehicle(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(vehicle_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = VehicleRepository::new((*state.db).clone());
    match repo.find_by_id(vehicle_id).await {
        Ok(Some(vehicle)) => (StatusCode::OK, Json(vehicle_json(&vehicle))).into_response(),
        Ok(None) => vehicle_error_response(&VehicleError::NotFound(vehicle_id)),
        Err(e) => vehicle_error_response(&e),
    }
}

/// PATCH `/vehicles/{vehicle_id}` - Update a vehicle.
async fn update_vehicle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(vehicle_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateVehicleBody>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = VehicleRepository::new((*state.db).clone());
    match repo
        .update(
            auth.user_id(),
            vehicle_id,
            UpdateVehicleInput {
                plate_number: payload.plate_number,
                vehicle_type_id: payload.vehicle_type_id,
                model: payload.model,
                year: payload.year,
                is_active: payload.is_active,
            },
        )
        .await
    {
        Ok(vehicle) => {
            info!(vehicle_id = %vehicle_id, "Vehicle updated");
            (StatusCode::OK, Json(vehicle_json(&vehicle))).into_response()
        }
        Err(e) => vehicle_error_response(&e),
    }
}

/// DELETE `/vehicles/{vehicle_id}` - Remove a vehicle without request history.
async fn delete_vehicle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(vehicle_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = VehicleRepository::new((*state.db).clone());
    match repo.delete(auth.user_id(), vehicle_id).await {
        Ok(()) => {
            info!(vehicle_id = %vehicle_id, deleted_by = %auth.user_id(), "Vehicle deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => vehicle_error_response(&e),
    }
}
