//! User administration routes.
//!
//! Accounts are deactivated rather than deleted so that submitted requests
//! and recorded decisions keep a valid author.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser, middleware::auth::unknown_role_response};
use fuelflow_core::workflow::{ApprovalEngine, Role};
use fuelflow_db::UserRepository;
use fuelflow_db::entities::users;
use fuelflow_db::repositories::user::{IdentityError, UpdateUserInput};

/// Creates the users router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}", patch(update_user))
        .route("/users/{user_id}", delete(deactivate_user))
}

/// Request body for updating a user.
#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    /// New display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// New role.
    #[serde(default)]
    pub role: Option<String>,
    /// Activate or deactivate the account.
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn user_json(user: &users::Model) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "display_name": user.display_name,
        "role": Role::from(user.role.clone()).as_str(),
        "is_active": user.is_active,
        "created_at": user.created_at,
        "updated_at": user.updated_at
    })
}

fn identity_error_response(err: &IdentityError) -> Response {
    let (status, code) = match err {
        IdentityError::EmailTaken(_) => (StatusCode::CONFLICT, "email_taken"),
        IdentityError::NotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
        IdentityError::Database(_) => {
            error!(error = %err, "Database error in user operation");
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
    if ApprovalEngine::can_manage_users(role) {
        None
    } else {
        Some(
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "Only admins and directors may manage users"
                })),
            )
                .into_response(),
        )
    }
}

/// GET /users - List all users.
async fn list_users(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(users) => {
            let items: Vec<_> = users.iter().map(user_json).collect();
            (StatusCode::OK, Json(json!({ "users": items }))).into_response()
        }
        Err(e) => identity_error_response(&e),
    }
}

/// GET `/users/{user_id}` - User detail.
///
/// Users may always fetch their own record; anything else needs a
/// management role.
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    if user_id != auth.user_id() {
        if let Some(denied) = manage_gate(&auth) {
            return denied;
        }
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.find_by_id(user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user_json(&user))).into_response(),
        Ok(None) => identity_error_response(&IdentityError::NotFound(user_id)),
        Err(e) => identity_error_response(&e),
    }
}

/// PATCH `/users/{user_id}` - Update a user's profile, role, or active flag.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateUserBody>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    let role = match payload.role.as_deref() {
        None => None,
        Some(s) => match Role::parse(s) {
            Some(r) => Some(r),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_role",
                        "message": "Invalid role. Must be one of: driver, supervisor, fueler, director, admin"
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = UserRepository::new((*state.db).clone());
    match repo
        .update(
            auth.user_id(),
            user_id,
            UpdateUserInput {
                display_name: payload.display_name,
                role,
                is_active: payload.is_active,
            },
        )
        .await
    {
        Ok(user) => {
            info!(user_id = %user_id, updated_by = %auth.user_id(), "User updated");
            (StatusCode::OK, Json(user_json(&user))).into_response()
        }
        Err(e) => identity_error_response(&e),
    }
}

/// DELETE `/users/{user_id}` - Deactivate a user account.
async fn deactivate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    if let Some(denied) = manage_gate(&auth) {
        return denied;
    }

    if user_id == auth.user_id() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "self_deactivation",
                "message": "You cannot deactivate your own account"
            })),
        )
            .into_response();
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.deactivate(auth.user_id(), user_id).await {
        Ok(user) => {
            info!(user_id = %user_id, deactivated_by = %auth.user_id(), "User deactivated");
            (StatusCode::OK, Json(user_json(&user))).into_response()
        }
        Err(e) => identity_error_response(&e),
    }
}
