//! Vendor-agnostic blob storage for justification attachments.
//!
//! Built on Apache OpenDAL so the same code talks to S3-compatible
//! providers, Azure Blob, or a local directory in development. Files never
//! pass through the API process: clients upload and download directly via
//! presigned URLs.

mod config;
mod error;
mod service;

pub use config::{BlobStoreConfig, StorageBackend};
pub use error::StorageError;
pub use service::{BlobMetadata, BlobStore, PresignedUrl, UploadTicket};
