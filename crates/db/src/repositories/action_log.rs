//! Action log repository.
//!
//! The action log is append-only. Writes happen inside the same
//! transaction as the state change they describe, so `record_in` takes any
//! connection; reads go through the repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::action_logs;

/// Input for recording one audit entry.
#[derive(Debug, Clone)]
pub struct RecordActionInput {
    /// Who performed the action.
    pub actor_id: Uuid,
    /// Action name, e.g. `fuel_request.submitted`.
    pub action: String,
    /// Entity type, e.g. `fuel_request`.
    pub entity_type: String,
    /// Entity ID.
    pub entity_id: Uuid,
    /// Optional structured detail.
    pub detail: Option<Value>,
}

/// Records an audit entry on the given connection or transaction.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn record_in<C: ConnectionTrait>(
    conn: &C,
    input: RecordActionInput,
) -> Result<action_logs::Model, DbErr> {
    let entry = action_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        actor_id: Set(input.actor_id),
        action: Set(input.action),
        entity_type: Set(input.entity_type),
        entity_id: Set(input.entity_id),
        detail: Set(input.detail),
        created_at: Set(Utc::now().into()),
    };
    entry.insert(conn).await
}

/// Action log repository for reads.
#[derive(Debug, Clone)]
pub struct ActionLogRepository {
    db: DatabaseConnection,
}

impl ActionLogRepository {
    /// Creates a new action log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists entries for one entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<action_logs::Model>, DbErr> {
        action_logs::Entity::find()
            .filter(action_logs::Column::EntityType.eq(entity_type))
            .filter(action_logs::Column::EntityId.eq(entity_id))
            .order_by_desc(action_logs::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Lists the most recent entries across all entities.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_recent(&self, limit: u64) -> Result<Vec<action_logs::Model>, DbErr> {
        action_logs::Entity::find()
            .order_by_desc(action_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }
}
