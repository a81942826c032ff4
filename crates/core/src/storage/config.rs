//! Blob store configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    /// S3-compatible object storage (AWS S3, Cloudflare R2, MinIO).
    S3 {
        /// Endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage.
    AzureBlob {
        /// Storage account name.
        account: String,
        /// Storage access key.
        access_key: String,
        /// Container name.
        container: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageBackend {
    /// Create an S3-compatible backend.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create an Azure Blob backend.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create a local filesystem backend.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Backend name for logging and the attachments table.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Blob store configuration.
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    /// Storage backend.
    pub backend: StorageBackend,
    /// Maximum attachment size in bytes.
    pub max_file_size: u64,
    /// Presigned upload URL TTL in seconds.
    pub presign_upload_ttl_secs: u64,
    /// Presigned download URL TTL in seconds.
    pub presign_download_ttl_secs: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
}

impl BlobStoreConfig {
    /// Default max attachment size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default upload TTL: 15 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 900;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a config with default limits and the default MIME allowlist.
    #[must_use]
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            backend,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Set maximum attachment size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Replace the MIME allowlist.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.allowed_mime_types = types;
        self
    }

    /// Default allowlist: justification attachments are photos of pumps,
    /// odometers, and receipts, plus the occasional scanned PDF.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "application/pdf".to_string(),
        ]
    }

    /// Check whether a MIME type is on the allowlist.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|t| t == mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        let s3 = StorageBackend::s3("http://localhost:9000", "fuel-docs", "ak", "sk", "auto");
        assert_eq!(s3.name(), "s3");

        let az = StorageBackend::azure_blob("fuelflowdev", "key", "fuel-docs");
        assert_eq!(az.name(), "azure_blob");

        let local = StorageBackend::local_fs("./blobs");
        assert_eq!(local.name(), "local");
    }

    #[test]
    fn test_config_defaults() {
        let config = BlobStoreConfig::new(StorageBackend::local_fs("./blobs"));
        assert_eq!(config.max_file_size, BlobStoreConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(
            config.presign_upload_ttl_secs,
            BlobStoreConfig::DEFAULT_UPLOAD_TTL
        );
        assert_eq!(
            config.presign_download_ttl_secs,
            BlobStoreConfig::DEFAULT_DOWNLOAD_TTL
        );
    }

    #[test]
    fn test_mime_allowlist() {
        let config = BlobStoreConfig::new(StorageBackend::local_fs("./blobs"));
        assert!(config.is_mime_type_allowed("image/jpeg"));
        assert!(config.is_mime_type_allowed("application/pdf"));
        assert!(!config.is_mime_type_allowed("application/msword"));
        assert!(!config.is_mime_type_allowed("text/html"));
        assert!(!config.is_mime_type_allowed("application/x-executable"));
    }
}
