//! Justification attachments for fuel requests.
//!
//! Drivers attach photos of odometers, pumps, and receipts to back up a
//! request. The flow is presign, direct upload, confirm: the API never
//! proxies file bytes.

mod error;
mod service;
mod types;

pub use error::AttachmentError;
pub use service::{AttachmentRepository, AttachmentService, ConfirmOutcome};
pub use types::{
    Attachment, AttachmentKind, ConfirmUploadInput, CreateAttachmentInput, RequestUploadInput,
    RequestUploadResult,
};
