//! Justification attachment routes.
//!
//! Uploads go directly to the blob store through presigned URLs; the API
//! only mints URLs and records confirmations. Attachment access follows
//! the owning fuel request's visibility, so a driver can never reach an
//! attachment on someone else's request.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, middleware::auth::unknown_role_response};
use fuelflow_core::attachment::{
    Attachment, AttachmentError, AttachmentKind, AttachmentService, ConfirmOutcome,
    ConfirmUploadInput, RequestUploadInput,
};
use fuelflow_core::storage::StorageError;
use fuelflow_core::workflow::{Role, WorkflowError};
use fuelflow_db::{SeaOrmAttachmentRepository, WorkflowRepository};

/// Creates the attachment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/fuel-requests/{request_id}/attachments/upload",
            post(request_upload),
        )
        .route(
            "/fuel-requests/{request_id}/attachments",
            post(confirm_upload),
        )
        .route(
            "/fuel-requests/{request_id}/attachments",
            get(list_attachments),
        )
        .route(
            "/attachments/{attachment_id}/download",
            get(download_attachment),
        )
        .route("/attachments/{attachment_id}", delete(delete_attachment))
}

/// Request body for requesting an upload URL.
#[derive(Debug, Deserialize)]
pub struct RequestUploadBody {
    /// Original filename.
    pub filename: String,
    /// MIME type of the file.
    pub content_type: String,
    /// Declared file size in bytes.
    pub file_size: u64,
    /// What the attachment documents.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Request body for confirming an upload.
#[derive(Debug, Deserialize)]
pub struct ConfirmUploadBody {
    /// Attachment ID from the upload request.
    pub attachment_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Declared file size in bytes.
    pub file_size: i64,
    /// Storage key from the upload request.
    pub storage_key: String,
    /// What the attachment documents.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Response for an upload URL request.
#[derive(Debug, Serialize)]
pub struct RequestUploadResponse {
    /// Generated attachment ID.
    pub attachment_id: Uuid,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub upload_method: String,
    /// Required headers for the upload.
    pub upload_headers: std::collections::HashMap<String, String>,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
    /// Storage key for confirmation.
    pub storage_key: String,
}

fn attachment_json(attachment: &Attachment) -> serde_json::Value {
    json!({
        "id": attachment.id,
        "request_id": attachment.request_id,
        "kind": attachment.kind.as_str(),
        "filename": attachment.filename,
        "file_size": attachment.file_size,
        "mime_type": attachment.mime_type,
        "storage_backend": attachment.storage_backend,
        "uploaded_by": attachment.uploaded_by,
        "verified_at": attachment.verified_at,
        "created_at": attachment.created_at
    })
}

fn parse_kind(s: Option<&str>) -> AttachmentKind {
    s.and_then(AttachmentKind::parse).unwrap_or_default()
}

fn attachment_error_response(err: &AttachmentError) -> Response {
    let (status, code) = match err {
        AttachmentError::NotFound(_) => (StatusCode::NOT_FOUND, "attachment_not_found"),
        AttachmentError::RequestNotFound(_) => (StatusCode::NOT_FOUND, "request_not_found"),
        AttachmentError::Storage(StorageError::FileTooLarge { .. }) => {
            (StatusCode::BAD_REQUEST, "file_too_large")
        }
        AttachmentError::Storage(StorageError::InvalidMimeType { .. }) => {
            (StatusCode::BAD_REQUEST, "invalid_mime_type")
        }
        AttachmentError::Storage(_) => {
            error!(error = %err, "Storage failure in attachment operation");
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
        }
        AttachmentError::Unauthorized(_) => (StatusCode::FORBIDDEN, "forbidden"),
        AttachmentError::Repository(_) => {
            error!(error = %err, "Repository failure in attachment operation");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    (
        status,
        Json(json!({ "error": code, "message": err.to_string() })),
    )
        .into_response()
}

fn storage_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "storage_not_configured",
            "message": "File storage is not configured"
        })),
    )
        .into_response()
}

/// Checks that the caller may see the fuel request at all.
///
/// Mirrors request visibility: a driver probing a foreign request gets
/// the same not-found response whether or not the request exists.
async fn check_request_access(
    state: &AppState,
    request_id: Uuid,
    user_id: Uuid,
    role: Role,
) -> Result<(), Response> {
    let repo = WorkflowRepository::new((*state.db).clone());
    match repo.get(request_id, user_id, role).await {
        Ok(_) => Ok(()),
        Err(WorkflowError::RequestNotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "request_not_found",
                "message": "Fuel request not found"
            })),
        )
            .into_response()),
        Err(e) => {
            error!(error = %e, "Failed to check request visibility");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response())
        }
    }
}

fn attachment_service(
    state: &AppState,
) -> Option<AttachmentService<SeaOrmAttachmentRepository>> {
    let storage = state.storage.as_ref()?;
    let repo = SeaOrmAttachmentRepository::new((*state.db).clone());
    Some(AttachmentService::new(Arc::clone(storage), Arc::new(repo)))
}

/// POST `/fuel-requests/{request_id}/attachments/upload` - Mint a presigned upload URL.
async fn request_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RequestUploadBody>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };
    if let Err(response) = check_request_access(&state, request_id, auth.user_id(), role).await {
        return response;
    }

    let Some(service) = attachment_service(&state) else {
        return storage_unavailable();
    };

    let input = RequestUploadInput {
        request_id,
        filename: payload.filename,
        content_type: payload.content_type,
        file_size: payload.file_size,
        kind: parse_kind(payload.kind.as_deref()),
        user_id: auth.user_id(),
    };

    match service.request_upload(input).await {
        Ok(result) => {
            info!(
                request_id = %request_id,
                attachment_id = %result.attachment_id,
                "Upload URL minted"
            );
            let response = RequestUploadResponse {
                attachment_id: result.attachment_id,
                upload_url: result.upload_url,
                upload_method: result.upload_method,
                upload_headers: result.upload_headers,
                expires_at: result.expires_at.to_rfc3339(),
                storage_key: result.storage_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => attachment_error_response(&e),
    }
}

/// POST `/fuel-requests/{request_id}/attachments` - Confirm an upload.
///
/// The record is created even when the object cannot be verified in the
/// store; an unverified confirmation reports a warning instead of failing.
async fn confirm_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ConfirmUploadBody>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };
    if let Err(response) = check_request_access(&state, request_id, auth.user_id(), role).await {
        return response;
    }

    let Some(service) = attachment_service(&state) else {
        return storage_unavailable();
    };

    let input = ConfirmUploadInput {
        attachment_id: payload.attachment_id,
        request_id,
        filename: payload.filename,
        content_type: payload.content_type,
        file_size: payload.file_size,
        storage_key: payload.storage_key,
        kind: parse_kind(payload.kind.as_deref()),
        uploaded_by: auth.user_id(),
    };

    match service.confirm_upload(input).await {
        Ok(ConfirmOutcome::Verified(attachment)) => {
            info!(
                request_id = %request_id,
                attachment_id = %attachment.id,
                "Attachment confirmed and verified"
            );
            (StatusCode::CREATED, Json(attachment_json(&attachment))).into_response()
        }
        Ok(ConfirmOutcome::Unverified { attachment, reason }) => {
            info!(
                request_id = %request_id,
                attachment_id = %attachment.id,
                reason = %reason,
                "Attachment confirmed but not verified"
            );
            let mut body = attachment_json(&attachment);
            body["warning"] = reason.into();
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => attachment_error_response(&e),
    }
}

/// GET `/fuel-requests/{request_id}/attachments` - List attachments.
async fn list_attachments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };
    if let Err(response) = check_request_access(&state, request_id, auth.user_id(), role).await {
        return response;
    }

    let Some(service) = attachment_service(&state) else {
        return storage_unavailable();
    };

    match service.list_by_request(request_id).await {
        Ok(attachments) => {
            let items: Vec<_> = attachments.iter().map(attachment_json).collect();
            (StatusCode::OK, Json(json!({ "attachments": items }))).into_response()
        }
        Err(e) => attachment_error_response(&e),
    }
}

/// GET `/attachments/{attachment_id}/download` - Mint a presigned download URL.
async fn download_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };
    let Some(service) = attachment_service(&state) else {
        return storage_unavailable();
    };

    let attachment = match service.get_by_id(attachment_id).await {
        Ok(a) => a,
        Err(e) => return attachment_error_response(&e),
    };
    if let Err(response) =
        check_request_access(&state, attachment.request_id, auth.user_id(), role).await
    {
        return response;
    }

    match service.download_url(attachment_id).await {
        Ok(presigned) => (
            StatusCode::OK,
            Json(json!({
                "download_url": presigned.url,
                "method": presigned.method,
                "expires_at": presigned.expires_at.to_rfc3339()
            })),
        )
            .into_response(),
        Err(e) => attachment_error_response(&e),
    }
}

/// DELETE `/attachments/{attachment_id}` - Delete an attachment and its object.
async fn delete_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(role) = auth.role() else {
        return unknown_role_response();
    };
    let Some(service) = attachment_service(&state) else {
        return storage_unavailable();
    };

    let attachment = match service.get_by_id(attachment_id).await {
        Ok(a) => a,
        Err(e) => return attachment_error_response(&e),
    };
    if let Err(response) =
        check_request_access(&state, attachment.request_id, auth.user_id(), role).await
    {
        return response;
    }

    // Drivers may remove only their own uploads; validating roles may
    // prune anything.
    if role == Role::Driver && attachment.uploaded_by != auth.user_id() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "You may only delete attachments you uploaded"
            })),
        )
            .into_response();
    }

    match service.delete(attachment_id).await {
        Ok(()) => {
            info!(
                attachment_id = %attachment_id,
                deleted_by = %auth.user_id(),
                "Attachment deleted"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => attachment_error_response(&e),
    }
}
