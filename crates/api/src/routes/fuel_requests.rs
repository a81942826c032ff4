//! Fuel request routes: submission, listing, detail, and decisions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser, middleware::auth::unknown_role_response};
use fuelflow_core::workflow::{
    DecisionOutcome, RequestStatus, SubmitRequestInput, WorkflowError,
};
use fuelflow_db::repositories::workflow::RequestDetail;
use fuelflow_db::{WorkflowRepository, entities::fuel_requests, entities::validation_records};

/// Creates the fuel request router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fuel-requests", post(submit_request))
        .route("/fuel-requests", get(list_requests))
        .route("/fuel-requests/{request_id}", get(get_request))
        .route("/fuel-requests/{request_id}/decision", post(decide_request))
        .route("/fuel-requests/{request_id}/served", post(record_served))
}

/// Request body for submitting a fuel request.
#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    /// Vehicle to fuel.
    pub vehicle_id: uuid::Uuid,
    /// Requested quantity in liters.
    pub quantity_requested: Decimal,
    /// Current odometer reading in kilometers.
    pub odometer_km: i64,
    /// Site the vehicle operates from.
    pub site: String,
    /// Free-text mission description.
    pub mission: String,
    /// Why the fuel is needed.
    pub justification: String,
}

/// Request body for recording the served fuel quantity.
#[derive(Debug, Deserialize)]
pub struct ServedBody {
    /// Quantity actually dispensed, in liters.
    pub quantity_served: Decimal,
}

/// Request body for a validation decision.
#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    /// "approve" or "reject".
    pub outcome: String,
    /// Optional validator comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Query parameters for listing fuel requests.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional status filter.
    #[serde(default)]
    pub status: Option<String>,
}

fn request_json(request: &fuel_requests::Model) -> serde_json::Value {
    json!({
        "id": request.id,
        "requester_id": request.requester_id,
        "vehicle_id": request.vehicle_id,
        "quantity_requested": request.quantity_requested,
        "quantity_served": request.quantity_served,
        "odometer_km": request.odometer_km,
        "site": request.site,
        "mission": request.mission,
        "justification": request.justification,
        "status": RequestStatus::from(request.status.clone()).as_str(),
        "created_at": request.created_at,
        "updated_at": request.updated_at
    })
}

fn validation_json(record: &validation_records::Model) -> serde_json::Value {
    json!({
        "id": record.id,
        "level": record.level,
        "validator_id": record.validator_id,
        "outcome": fuelflow_core::workflow::DecisionOutcome::from(record.outcome.clone()).as_str(),
        "comment": record.comment,
        "decided_at": record.decided_at
    })
}

fn detail_json(detail: &RequestDetail) -> serde_json::Value {
    let mut body = request_json(&detail.request);
    body["validations"] = detail
        .validations
        .iter()
        .map(validation_json)
        .collect::<Vec<_>>()
        .into();
    body
}

fn workflow_error_response(err: &WorkflowError) -> Response {
    if matches!(err, WorkflowError::Store(_)) {
        error!(error = %err, "Workflow store failure");
    }
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// POST /fuel-requests - Submit a new fuel request.
async fn submit_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SubmitRequestBody>,
) -> impl IntoResponse {
    let repo = WorkflowRepository::new((*state.db).clone());

    let input = SubmitRequestInput {
        vehicle_id: payload.vehicle_id,
        quantity_requested: payload.quantity_requested,
        odometer_km: payload.odometer_km,
        site: payload.site,
        mission: payload.mission,
        justification: payload.justification,
    };

    match repo.submit(auth.user_id(), input).await {
        Ok(request) => {
            info!(
                request_id = %request.id,
                requester_id = %auth.user_id(),
                vehicle_id = %request.vehicle_id,
                "Fuel request submitted"
            );
            (StatusCode::CREATED, Json(request_json(&request))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET /fuel-requests - List requests visible to the caller.
async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };

    let status = match query.status.as_deref() {
        None => None,
        Some(s) => match RequestStatus::parse(s) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_status",
                        "message": format!("Unknown status filter: {s}")
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo.list(auth.user_id(), role, status).await {
        Ok(requests) => {
            let items: Vec<_> = requests.iter().map(request_json).collect();
            (StatusCode::OK, Json(json!({ "requests": items }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/fuel-requests/{request_id}` - Request detail with decision history.
async fn get_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo.get(request_id, auth.user_id(), role).await {
        Ok(detail) => (StatusCode::OK, Json(detail_json(&detail))).into_response(),
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/fuel-requests/{request_id}/decision` - Apply one validation decision.
async fn decide_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<uuid::Uuid>,
    Json(payload): Json<DecisionBody>,
) -> impl IntoResponse {
    let Some(outcome) = DecisionOutcome::parse(&payload.outcome) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_outcome",
                "message": "Outcome must be \"approve\" or \"reject\""
            })),
        )
            .into_response();
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .decide(request_id, auth.user_id(), outcome, payload.comment)
        .await
    {
        Ok(detail) => {
            info!(
                request_id = %request_id,
                validator_id = %auth.user_id(),
                outcome = %outcome,
                status = %RequestStatus::from(detail.request.status.clone()),
                "Decision applied"
            );
            (StatusCode::OK, Json(detail_json(&detail))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/fuel-requests/{request_id}/served` - Record the dispensed quantity.
async fn record_served(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<uuid::Uuid>,
    Json(payload): Json<ServedBody>,
) -> impl IntoResponse {
    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .record_served_quantity(request_id, auth.user_id(), payload.quantity_served)
        .await
    {
        Ok(request) => {
            info!(
                request_id = %request_id,
                actor_id = %auth.user_id(),
                quantity_served = %payload.quantity_served,
                "Served quantity recorded"
            );
            (StatusCode::OK, Json(request_json(&request))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}
