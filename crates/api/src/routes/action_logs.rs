//! Audit trail routes.
//!
//! Read-only: entries are written by the repositories as part of each
//! mutation and never through the API.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser, middleware::auth::unknown_role_response};
use fuelflow_core::workflow::ApprovalEngine;
use fuelflow_db::ActionLogRepository;
use fuelflow_db::entities::action_logs;

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 500;

/// Creates the action logs router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/action-logs", get(list_logs))
}

/// Query parameters for listing audit entries.
///
/// `entity_type` and `entity_id` must be given together; without them the
/// most recent entries across all entities are returned.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Entity type filter, e.g. `fuel_request`.
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Entity ID filter.
    #[serde(default)]
    pub entity_id: Option<uuid::Uuid>,
    /// Maximum number of entries when listing across entities.
    #[serde(default)]
    pub limit: Option<u64>,
}

fn entry_json(entry: &action_logs::Model) -> serde_json::Value {
    json!({
        "id": entry.id,
        "actor_id": entry.actor_id,
        "action": entry.action,
        "entity_type": entry.entity_type,
        "entity_id": entry.entity_id,
        "detail": entry.detail,
        "created_at": entry.created_at
    })
}

fn audit_gate(auth: &AuthUser) -> Option<Response> {
    let Some(role) = auth.role() else {
        return Some(unknown_role_response());
    };
    if ApprovalEngine::can_view_audit(role) {
        None
    } else {
        Some(
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "Only admins and directors may view the audit trail"
                })),
            )
                .into_response(),
        )
    }
}

/// GET /action-logs - List audit entries, newest first.
async fn list_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    if let Some(denied) = audit_gate(&auth) {
        return denied;
    }

    let repo = ActionLogRepository::new((*state.db).clone());
    let result = match (query.entity_type.as_deref(), query.entity_id) {
        (Some(entity_type), Some(entity_id)) => {
            repo.list_for_entity(entity_type, entity_id).await
        }
        (None, None) => {
            let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
            repo.list_recent(limit).await
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "incomplete_filter",
                    "message": "entity_type and entity_id must be given together"
                })),
            )
                .into_response();
        }
    };

    match result {
        Ok(entries) => {
            let items: Vec<_> = entries.iter().map(entry_json).collect();
            (StatusCode::OK, Json(json!({ "action_logs": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing audit entries");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Failed to list audit entries"
                })),
            )
                .into_response()
        }
    }
}
