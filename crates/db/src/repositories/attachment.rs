//! SeaORM-backed attachment repository.
//!
//! Implements the core `AttachmentRepository` trait, converting between
//! the entity model and the core domain type at the boundary.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use fuelflow_core::attachment::{
    Attachment, AttachmentError, AttachmentKind, AttachmentRepository, CreateAttachmentInput,
};

use crate::entities::{attachments, fuel_requests};

/// Attachment repository backed by the database.
#[derive(Debug, Clone)]
pub struct SeaOrmAttachmentRepository {
    db: DatabaseConnection,
}

impl SeaOrmAttachmentRepository {
    /// Creates a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: attachments::Model) -> Attachment {
    Attachment {
        id: model.id,
        request_id: model.request_id,
        kind: AttachmentKind::parse(&model.kind).unwrap_or_default(),
        filename: model.filename,
        file_size: model.file_size,
        mime_type: model.mime_type,
        storage_backend: model.storage_backend,
        storage_key: model.storage_key,
        uploaded_by: model.uploaded_by,
        verified_at: model.verified_at.map(Into::into),
        created_at: model.created_at.into(),
    }
}

impl AttachmentRepository for SeaOrmAttachmentRepository {
    async fn create(&self, input: CreateAttachmentInput) -> Result<Attachment, AttachmentError> {
        let model = attachments::ActiveModel {
            id: Set(input.id),
            request_id: Set(input.request_id),
            kind: Set(input.kind.as_str().to_string()),
            filename: Set(input.filename),
            file_size: Set(input.file_size),
            mime_type: Set(input.mime_type),
            storage_backend: Set(input.storage_backend),
            storage_key: Set(input.storage_key),
            uploaded_by: Set(input.uploaded_by),
            verified_at: Set(input.verified_at.map(Into::into)),
            created_at: Set(chrono::Utc::now().into()),
        };

        model
            .insert(&self.db)
            .await
            .map(to_domain)
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, AttachmentError> {
        attachments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map(|m| m.map(to_domain))
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }

    async fn list_by_request(&self, request_id: Uuid) -> Result<Vec<Attachment>, AttachmentError> {
        attachments::Entity::find()
            .filter(attachments::Column::RequestId.eq(request_id))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map(|models| models.into_iter().map(to_domain).collect())
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AttachmentError> {
        let Some(model) = attachments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?
        else {
            return Ok(false);
        };

        model
            .delete(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;
        Ok(true)
    }

    async fn request_exists(&self, request_id: Uuid) -> Result<bool, AttachmentError> {
        fuel_requests::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map(|m| m.is_some())
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }
}
