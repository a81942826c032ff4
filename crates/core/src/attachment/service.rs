//! Attachment service implementation.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::error::AttachmentError;
use super::types::{
    Attachment, ConfirmUploadInput, CreateAttachmentInput, RequestUploadInput, RequestUploadResult,
};
use crate::storage::{BlobStore, PresignedUrl, UploadTicket};

/// Repository trait for attachment persistence.
///
/// Implemented by the db crate.
pub trait AttachmentRepository: Send + Sync {
    /// Create a new attachment record.
    fn create(
        &self,
        input: CreateAttachmentInput,
    ) -> impl std::future::Future<Output = Result<Attachment, AttachmentError>> + Send;

    /// Find attachment by ID.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// List attachments for a fuel request.
    fn list_by_request(
        &self,
        request_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Attachment>, AttachmentError>> + Send;

    /// Delete attachment by ID. Returns whether a row was removed.
    fn delete(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;

    /// Check whether a fuel request exists.
    fn request_exists(
        &self,
        request_id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, AttachmentError>> + Send;
}

/// Outcome of confirming an upload.
///
/// Confirmation is a partial-success operation: the record is always
/// written once the request exists, but the object may not be verifiable
/// in the store at that moment. Unverified attachments carry a NULL
/// `verified_at` and can be re-verified later.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// The object was found in the store; the record is fully verified.
    Verified(Attachment),
    /// The record was written but the object could not be verified.
    Unverified {
        /// The attachment record, with `verified_at` unset.
        attachment: Attachment,
        /// Why verification failed.
        reason: String,
    },
}

impl ConfirmOutcome {
    /// The attachment record, verified or not.
    #[must_use]
    pub fn attachment(&self) -> &Attachment {
        match self {
            Self::Verified(a) | Self::Unverified { attachment: a, .. } => a,
        }
    }
}

/// Service coordinating the blob store and the attachment repository.
pub struct AttachmentService<R: AttachmentRepository> {
    storage: Arc<BlobStore>,
    repo: Arc<R>,
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(storage: Arc<BlobStore>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    /// Request an upload URL for a new attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the fuel request does not exist, the declared
    /// size or MIME type is not acceptable, or the store cannot presign.
    pub async fn request_upload(
        &self,
        input: RequestUploadInput,
    ) -> Result<RequestUploadResult, AttachmentError> {
        if !self.repo.request_exists(input.request_id).await? {
            return Err(AttachmentError::RequestNotFound(input.request_id));
        }

        let attachment_id = Uuid::new_v4();
        let ticket = UploadTicket {
            request_id: Some(input.request_id),
            attachment_id,
            filename: input.filename.clone(),
            content_type: input.content_type.clone(),
            file_size: input.file_size,
        };

        let presigned = self.storage.presign_upload(&ticket).await?;
        let storage_key = BlobStore::storage_key(&ticket);

        Ok(RequestUploadResult {
            attachment_id,
            upload_url: presigned.url,
            upload_method: presigned.method,
            upload_headers: presigned.headers,
            expires_at: presigned.expires_at,
            storage_key,
        })
    }

    /// Confirm an upload and create the attachment record.
    ///
    /// If the object cannot be statted or its size disagrees with the
    /// declared size, the record is still written with `verified_at`
    /// unset and the outcome reports why.
    ///
    /// # Errors
    ///
    /// Returns an error if the fuel request does not exist or the record
    /// cannot be written.
    pub async fn confirm_upload(
        &self,
        input: ConfirmUploadInput,
    ) -> Result<ConfirmOutcome, AttachmentError> {
        if !self.repo.request_exists(input.request_id).await? {
            return Err(AttachmentError::RequestNotFound(input.request_id));
        }

        let verification = match self.storage.verify_upload(&input.storage_key).await {
            Ok(meta) => {
                let declared = u64::try_from(input.file_size).unwrap_or(0);
                if meta.file_size == declared {
                    Ok(())
                } else {
                    Err(format!(
                        "size mismatch: declared {declared}, stored {}",
                        meta.file_size
                    ))
                }
            }
            Err(e) => Err(format!("object not verifiable: {e}")),
        };

        let verified_at = verification.is_ok().then(Utc::now);

        let attachment = self
            .repo
            .create(CreateAttachmentInput {
                id: input.attachment_id,
                request_id: input.request_id,
                kind: input.kind,
                filename: input.filename,
                file_size: input.file_size,
                mime_type: input.content_type,
                storage_backend: self.storage.backend_name().to_string(),
                storage_key: input.storage_key,
                uploaded_by: input.uploaded_by,
                verified_at,
            })
            .await?;

        Ok(match verification {
            Ok(()) => ConfirmOutcome::Verified(attachment),
            Err(reason) => ConfirmOutcome::Unverified { attachment, reason },
        })
    }

    /// Get a presigned download URL for an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment does not exist or the store
    /// cannot presign.
    pub async fn download_url(&self, attachment_id: Uuid) -> Result<PresignedUrl, AttachmentError> {
        let attachment = self
            .repo
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))?;

        Ok(self.storage.presign_download(&attachment.storage_key).await?)
    }

    /// Delete an attachment and its stored object.
    ///
    /// The store delete is best effort; a missing object must not keep
    /// the record alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment does not exist or the record
    /// cannot be removed.
    pub async fn delete(&self, attachment_id: Uuid) -> Result<(), AttachmentError> {
        let attachment = self
            .repo
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))?;

        let _ = self.storage.delete(&attachment.storage_key).await;
        self.repo.delete(attachment_id).await?;
        Ok(())
    }

    /// List attachments for a fuel request.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_by_request(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<Attachment>, AttachmentError> {
        self.repo.list_by_request(request_id).await
    }

    /// Get attachment by ID.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::NotFound` if absent.
    pub async fn get_by_id(&self, attachment_id: Uuid) -> Result<Attachment, AttachmentError> {
        self.repo
            .find_by_id(attachment_id)
            .await?
            .ok_or(AttachmentError::NotFound(attachment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentKind;
    use crate::storage::{BlobStoreConfig, StorageBackend};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    struct MockAttachmentRepository {
        attachments: Mutex<HashMap<Uuid, Attachment>>,
        requests: Mutex<HashSet<Uuid>>,
    }

    impl MockAttachmentRepository {
        fn new() -> Self {
            Self {
                attachments: Mutex::new(HashMap::new()),
                requests: Mutex::new(HashSet::new()),
            }
        }

        fn add_request(&self, id: Uuid) {
            self.requests.lock().unwrap().insert(id);
        }
    }

    impl AttachmentRepository for MockAttachmentRepository {
        async fn create(
            &self,
            input: CreateAttachmentInput,
        ) -> Result<Attachment, AttachmentError> {
            let attachment = Attachment {
                id: input.id,
                request_id: input.request_id,
                kind: input.kind,
                filename: input.filename,
                file_size: input.file_size,
                mime_type: input.mime_type,
                storage_backend: input.storage_backend,
                storage_key: input.storage_key,
                uploaded_by: input.uploaded_by,
                verified_at: input.verified_at,
                created_at: Utc::now(),
            };
            self.attachments
                .lock()
                .unwrap()
                .insert(attachment.id, attachment.clone());
            Ok(attachment)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, AttachmentError> {
            Ok(self.attachments.lock().unwrap().get(&id).cloned())
        }

        async fn list_by_request(
            &self,
            request_id: Uuid,
        ) -> Result<Vec<Attachment>, AttachmentError> {
            Ok(self
                .attachments
                .lock()
                .unwrap()
                .values()
                .filter(|a| a.request_id == request_id)
                .cloned()
                .collect())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AttachmentError> {
            Ok(self.attachments.lock().unwrap().remove(&id).is_some())
        }

        async fn request_exists(&self, request_id: Uuid) -> Result<bool, AttachmentError> {
            Ok(self.requests.lock().unwrap().contains(&request_id))
        }
    }

    fn service() -> (AttachmentService<MockAttachmentRepository>, Arc<MockAttachmentRepository>) {
        let config = BlobStoreConfig::new(StorageBackend::local_fs("./test-blobs"));
        let storage = Arc::new(BlobStore::from_config(config).unwrap());
        let repo = Arc::new(MockAttachmentRepository::new());
        (AttachmentService::new(storage, Arc::clone(&repo)), repo)
    }

    #[tokio::test]
    async fn test_request_upload_unknown_request() {
        let (svc, _repo) = service();

        let result = svc
            .request_upload(RequestUploadInput {
                request_id: Uuid::new_v4(),
                filename: "pump.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                file_size: 1024,
                kind: AttachmentKind::PumpPhoto,
                user_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(AttachmentError::RequestNotFound(_))));
    }

    #[tokio::test]
    async fn test_confirm_upload_unverifiable_is_partial_success() {
        let (svc, repo) = service();
        let request_id = Uuid::new_v4();
        repo.add_request(request_id);

        // Nothing was uploaded, so verification must fail but the record
        // must still be written.
        let outcome = svc
            .confirm_upload(ConfirmUploadInput {
                attachment_id: Uuid::new_v4(),
                request_id,
                filename: "receipt.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                file_size: 2048,
                storage_key: format!("{request_id}/missing/receipt.pdf"),
                kind: AttachmentKind::Receipt,
                uploaded_by: Uuid::new_v4(),
            })
            .await
            .unwrap();

        match outcome {
            ConfirmOutcome::Unverified { attachment, .. } => {
                assert!(attachment.verified_at.is_none());
                assert_eq!(repo.attachments.lock().unwrap().len(), 1);
            }
            ConfirmOutcome::Verified(_) => panic!("expected unverified outcome"),
        }
    }

    #[tokio::test]
    async fn test_get_attachment_not_found() {
        let (svc, _repo) = service();
        let result = svc.get_by_id(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AttachmentError::NotFound(_))));
    }
}
