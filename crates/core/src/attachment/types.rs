//! Attachment types and data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a justification attachment documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Photo of the odometer at submission time.
    OdometerPhoto,
    /// Photo of the pump display after fueling.
    PumpPhoto,
    /// Fuel purchase receipt.
    Receipt,
    /// Anything else.
    #[default]
    Other,
}

impl AttachmentKind {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OdometerPhoto => "odometer_photo",
            Self::PumpPhoto => "pump_photo",
            Self::Receipt => "receipt",
            Self::Other => "other",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "odometer_photo" => Some(Self::OdometerPhoto),
            "pump_photo" => Some(Self::PumpPhoto),
            "receipt" => Some(Self::Receipt),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Input for requesting an upload URL.
#[derive(Debug, Clone)]
pub struct RequestUploadInput {
    /// Fuel request to attach to.
    pub request_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// MIME type of the file.
    pub content_type: String,
    /// Declared file size in bytes.
    pub file_size: u64,
    /// What the attachment documents.
    pub kind: AttachmentKind,
    /// User requesting the upload.
    pub user_id: Uuid,
}

/// Result of requesting an upload URL.
#[derive(Debug, Clone)]
pub struct RequestUploadResult {
    /// Generated attachment ID.
    pub attachment_id: Uuid,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub upload_method: String,
    /// Headers the client must send.
    pub upload_headers: std::collections::HashMap<String, String>,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Storage key for the object.
    pub storage_key: String,
}

/// Input for confirming an upload.
#[derive(Debug, Clone)]
pub struct ConfirmUploadInput {
    /// Attachment ID from the upload request.
    pub attachment_id: Uuid,
    /// Fuel request the attachment belongs to.
    pub request_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Declared file size in bytes.
    pub file_size: i64,
    /// Storage key returned by the upload request.
    pub storage_key: String,
    /// What the attachment documents.
    pub kind: AttachmentKind,
    /// User who uploaded.
    pub uploaded_by: Uuid,
}

/// Input for creating an attachment record.
#[derive(Debug, Clone)]
pub struct CreateAttachmentInput {
    /// Attachment ID.
    pub id: Uuid,
    /// Fuel request ID.
    pub request_id: Uuid,
    /// What the attachment documents.
    pub kind: AttachmentKind,
    /// Original filename.
    pub filename: String,
    /// Declared file size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Storage backend name.
    pub storage_backend: String,
    /// Storage key.
    pub storage_key: String,
    /// User who uploaded.
    pub uploaded_by: Uuid,
    /// When the object was confirmed present in the store.
    ///
    /// `None` means the record exists but the object could not be verified
    /// at confirmation time.
    pub verified_at: Option<DateTime<Utc>>,
}

/// Attachment domain model.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Unique identifier.
    pub id: Uuid,
    /// Fuel request ID.
    pub request_id: Uuid,
    /// What the attachment documents.
    pub kind: AttachmentKind,
    /// Original filename.
    pub filename: String,
    /// File size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Storage backend name.
    pub storage_backend: String,
    /// Storage key.
    pub storage_key: String,
    /// User who uploaded.
    pub uploaded_by: Uuid,
    /// When the object was confirmed present, if it was.
    pub verified_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            AttachmentKind::OdometerPhoto,
            AttachmentKind::PumpPhoto,
            AttachmentKind::Receipt,
            AttachmentKind::Other,
        ] {
            assert_eq!(AttachmentKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_kind_unknown() {
        assert_eq!(AttachmentKind::parse("invoice"), None);
    }
}
