//! Blob store built on Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opendal::{services, ErrorKind, Operator};
use uuid::Uuid;

use super::config::{BlobStoreConfig, StorageBackend};
use super::error::StorageError;

/// Presigned URL handed to the client for a direct upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Headers the client must send with the request.
    pub headers: HashMap<String, String>,
}

/// Everything needed to mint an upload URL for one attachment.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    /// Fuel request the attachment belongs to, if already linked.
    pub request_id: Option<Uuid>,
    /// Attachment ID.
    pub attachment_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Declared file size in bytes.
    pub file_size: u64,
}

/// Metadata observed for an uploaded object.
#[derive(Debug, Clone)]
pub struct BlobMetadata {
    /// Storage key.
    pub storage_key: String,
    /// Object size in bytes.
    pub file_size: u64,
    /// Content type reported by the store.
    pub content_type: Option<String>,
}

/// Blob store for justification attachments.
pub struct BlobStore {
    operator: Operator,
    config: BlobStoreConfig,
}

impl BlobStore {
    /// Create a blob store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    pub fn from_config(config: BlobStoreConfig) -> Result<Self, StorageError> {
        let operator = Self::build_operator(&config.backend)?;
        Ok(Self { operator, config })
    }

    fn build_operator(backend: &StorageBackend) -> Result<Operator, StorageError> {
        let operator = match backend {
            StorageBackend::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageBackend::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageBackend::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };
        Ok(operator)
    }

    /// Validate a declared upload against the configured limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the size or MIME type is not acceptable.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Storage key for an attachment.
    ///
    /// Format: `{request_id|unlinked}/{attachment_id}/{sanitized_filename}`.
    #[must_use]
    pub fn storage_key(ticket: &UploadTicket) -> String {
        let request_part = ticket
            .request_id
            .map_or_else(|| "unlinked".to_string(), |id| id.to_string());

        format!(
            "{}/{}/{}",
            request_part,
            ticket.attachment_id,
            sanitize_filename(&ticket.filename)
        )
    }

    /// Mint a presigned upload URL.
    ///
    /// # Errors
    ///
    /// Fails validation errors through unchanged; otherwise errors only if
    /// the backend cannot presign.
    pub async fn presign_upload(&self, ticket: &UploadTicket) -> Result<PresignedUrl, StorageError> {
        self.validate_upload(&ticket.content_type, ticket.file_size)?;

        let key = Self::storage_key(ticket);
        let ttl = Duration::from_secs(self.config.presign_upload_ttl_secs);

        let presigned = self
            .operator
            .presign_write(&key, ttl)
            .await
            .map_err(StorageError::from)?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), ticket.content_type.clone());

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now() + self.upload_ttl_chrono(),
            headers,
        })
    }

    /// Mint a presigned download URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot presign.
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(self.config.presign_download_ttl_secs).unwrap_or(i64::MAX),
                ),
            headers: HashMap::new(),
        })
    }

    /// Stat an object to confirm the client actually uploaded it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object is absent.
    pub async fn verify_upload(&self, key: &str) -> Result<BlobMetadata, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;

        Ok(BlobMetadata {
            storage_key: key.to_string(),
            file_size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check whether an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// The backend name, for logs and the attachments table.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.config.backend.name()
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &BlobStoreConfig {
        &self.config
    }

    fn upload_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            i64::try_from(self.config.presign_upload_ttl_secs).unwrap_or(i64::MAX),
        )
    }
}

/// Sanitize a filename for use inside a storage key.
///
/// Anything outside ASCII alphanumerics, dots, hyphens, and underscores is
/// replaced with an underscore.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(request_id: Option<Uuid>) -> UploadTicket {
        UploadTicket {
            request_id,
            attachment_id: Uuid::new_v4(),
            filename: "pump-reading.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            file_size: 4096,
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("pump-reading.jpg"), "pump-reading.jpg");
        assert_eq!(sanitize_filename("receipt (1).pdf"), "receipt__1_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_storage_key_linked() {
        let request_id = Uuid::new_v4();
        let t = ticket(Some(request_id));

        let key = BlobStore::storage_key(&t);
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], request_id.to_string());
        assert_eq!(parts[1], t.attachment_id.to_string());
        assert_eq!(parts[2], "pump-reading.jpg");
    }

    #[test]
    fn test_storage_key_unlinked() {
        let key = BlobStore::storage_key(&ticket(None));
        assert!(key.starts_with("unlinked/"));
    }

    #[test]
    fn test_validate_upload_size() {
        let config =
            BlobStoreConfig::new(StorageBackend::local_fs("./blobs")).with_max_file_size(1024);
        let store = BlobStore::from_config(config).expect("should create store");

        assert!(store.validate_upload("image/png", 512).is_ok());
        assert!(matches!(
            store.validate_upload("image/png", 2048),
            Err(StorageError::FileTooLarge { size: 2048, max: 1024 })
        ));
    }

    #[test]
    fn test_validate_upload_mime_type() {
        let config = BlobStoreConfig::new(StorageBackend::local_fs("./blobs"));
        let store = BlobStore::from_config(config).expect("should create store");

        assert!(store.validate_upload("image/jpeg", 1024).is_ok());
        assert!(store.validate_upload("application/pdf", 1024).is_ok());
        assert!(matches!(
            store.validate_upload("application/x-executable", 1024),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Sanitized filenames never escape the key structure.
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            for c in sanitize_filename(&filename).chars() {
                prop_assert!(
                    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_',
                    "unexpected character: {c}"
                );
            }
        }

        // Storage keys always have exactly three segments with the
        // attachment id in the middle.
        #[test]
        fn prop_storage_key_shape(
            filename in "[a-zA-Z0-9 _()-]{1,40}\\.[a-z]{2,4}",
            linked in any::<bool>(),
        ) {
            let request_id = Uuid::new_v4();
            let attachment_id = Uuid::new_v4();

            let ticket = UploadTicket {
                request_id: linked.then_some(request_id),
                attachment_id,
                filename,
                content_type: "image/png".to_string(),
                file_size: 1024,
            };

            let key = BlobStore::storage_key(&ticket);
            let parts: Vec<&str> = key.split('/').collect();
            prop_assert_eq!(parts.len(), 3);
            if linked {
                prop_assert_eq!(parts[0], request_id.to_string());
            } else {
                prop_assert_eq!(parts[0], "unlinked");
            }
            prop_assert_eq!(parts[1], attachment_id.to_string());
        }

        // The size limit is enforced exactly.
        #[test]
        fn prop_size_limit(
            max_size in 1024u64..10_000_000,
            file_size in 0u64..20_000_000,
        ) {
            let config = BlobStoreConfig::new(StorageBackend::local_fs("./blobs"))
                .with_max_file_size(max_size);
            let store = BlobStore::from_config(config).expect("should create store");

            let result = store.validate_upload("application/pdf", file_size);
            if file_size <= max_size {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(
                    matches!(result, Err(StorageError::FileTooLarge { .. })),
                    "expected FileTooLarge for {file_size} > {max_size}"
                );
            }
        }
    }
}
