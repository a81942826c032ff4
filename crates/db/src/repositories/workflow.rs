//! Workflow repository for fuel-request submission and approval decisions.
//!
//! Decisions are applied atomically: the status update, the validation
//! record, and the audit entry commit together or not at all. The status
//! update is guarded on the observed status, so of two concurrent
//! validators exactly one wins and the loser gets a stale-transition
//! error without writing anything.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use fuelflow_core::workflow::{
    ApprovalEngine, DecisionOutcome, RequestStatus, Role, SubmitRequestInput, WorkflowError,
};

use crate::entities::{
    fuel_requests, sea_orm_active_enums, users, validation_records, vehicles,
};
use crate::repositories::action_log::{record_in, RecordActionInput};
use crate::rls::set_rls_context;

/// A fuel request together with its decision history.
#[derive(Debug, Clone)]
pub struct RequestDetail {
    /// The request row.
    pub request: fuel_requests::Model,
    /// Validation records, in level order.
    pub validations: Vec<validation_records::Model>,
}

/// Workflow repository.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits a new fuel request on behalf of a driver.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the requester is not an active
    /// driver, a field is invalid, or the vehicle is missing or inactive.
    pub async fn submit(
        &self,
        requester_id: Uuid,
        input: SubmitRequestInput,
    ) -> Result<fuel_requests::Model, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let requester = users::Entity::find_by_id(requester_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or_else(|| WorkflowError::Store(format!("requester {requester_id} missing")))?;

        let requester_role = Role::from(requester.role.clone());
        if !requester.is_active {
            return Err(WorkflowError::InactiveActor(requester_id));
        }

        set_rls_context(&txn, requester_id, requester_role)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let vehicle = vehicles::Entity::find_by_id(input.vehicle_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        input.validate(requester_role, vehicle.map(|v| v.is_active))?;

        let now = Utc::now().into();
        let request = fuel_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            requester_id: Set(requester_id),
            vehicle_id: Set(input.vehicle_id),
            quantity_requested: Set(input.quantity_requested),
            quantity_served: Set(None),
            odometer_km: Set(input.odometer_km),
            site: Set(input.site),
            mission: Set(input.mission),
            justification: Set(input.justification),
            status: Set(sea_orm_active_enums::RequestStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let request = request
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id: requester_id,
                action: "fuel_request.submitted".to_string(),
                entity_type: "fuel_request".to_string(),
                entity_id: request.id,
                detail: Some(json!({
                    "vehicle_id": request.vehicle_id,
                    "quantity_requested": request.quantity_requested,
                })),
            },
        )
        .await
        .map_err(|e| WorkflowError::Store(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        Ok(request)
    }

    /// Applies one validation decision to a request.
    ///
    /// Resolves the transition against the approval table, then applies
    /// all three effects in one transaction with the status update guarded
    /// on the status the decision was evaluated against.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound` when the request does not exist
    /// - `InactiveActor` when the actor's account is deactivated
    /// - `UnauthorizedTransition` when the actor's role may not decide at
    ///   the request's current stage
    /// - `StaleTransition` when a concurrent decision won the race, or
    ///   when the actor's level has already been decided on this request
    /// - `Store` on database failure
    pub async fn decide(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        outcome: DecisionOutcome,
        comment: Option<String>,
    ) -> Result<RequestDetail, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let actor = users::Entity::find_by_id(actor_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or_else(|| WorkflowError::Store(format!("actor {actor_id} missing")))?;
        let actor_role = Role::from(actor.role.clone());

        set_rls_context(&txn, actor_id, actor_role)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let request = fuel_requests::Entity::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or(WorkflowError::RequestNotFound(request_id))?;

        let observed = RequestStatus::from(request.status.clone());

        // Inactive validators may not decide, whatever their role.
        if !actor.is_active {
            return Err(WorkflowError::InactiveActor(actor_id));
        }

        let action = match ApprovalEngine::resolve(observed, actor_role, outcome, actor_id, comment)
        {
            Ok(action) => action,
            Err(err @ WorkflowError::UnauthorizedTransition { .. }) => {
                // A validator whose level already has a record on this
                // request is retrying, not overreaching. Report that as
                // a stale transition so retries after a commit are not
                // mistaken for permission errors.
                if let Some(rule) = ApprovalEngine::rule_for_actor(actor_role) {
                    let already_decided = validation_records::Entity::find()
                        .filter(validation_records::Column::RequestId.eq(request_id))
                        .filter(validation_records::Column::Level.eq(rule.level.as_i16()))
                        .one(&txn)
                        .await
                        .map_err(|e| WorkflowError::Store(e.to_string()))?
                        .is_some();
                    if already_decided {
                        return Err(WorkflowError::StaleTransition {
                            request_id,
                            status: observed,
                        });
                    }
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        // Guarded update: only flips the status if nobody got there first.
        let update = fuel_requests::Entity::update_many()
            .set(fuel_requests::ActiveModel {
                status: Set(sea_orm_active_enums::RequestStatus::from(action.new_status)),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .filter(fuel_requests::Column::Id.eq(request_id))
            .filter(
                fuel_requests::Column::Status
                    .eq(sea_orm_active_enums::RequestStatus::from(observed)),
            )
            .exec(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        if update.rows_affected == 0 {
            let fresh = fuel_requests::Entity::find_by_id(request_id)
                .one(&txn)
                .await
                .map_err(|e| WorkflowError::Store(e.to_string()))?
                .ok_or(WorkflowError::RequestNotFound(request_id))?;
            return Err(WorkflowError::StaleTransition {
                request_id,
                status: RequestStatus::from(fresh.status),
            });
        }

        let record = validation_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            request_id: Set(request_id),
            level: Set(action.level.as_i16()),
            validator_id: Set(actor_id),
            outcome: Set(sea_orm_active_enums::DecisionOutcome::from(action.outcome)),
            comment: Set(action.comment.clone()),
            decided_at: Set(action.decided_at.into()),
        };
        record
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "fuel_request.decided".to_string(),
                entity_type: "fuel_request".to_string(),
                entity_id: request_id,
                detail: Some(json!({
                    "level": action.level.as_i16(),
                    "outcome": action.outcome.as_str(),
                    "from": observed.as_str(),
                    "to": action.new_status.as_str(),
                })),
            },
        )
        .await
        .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let request = fuel_requests::Entity::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or(WorkflowError::RequestNotFound(request_id))?;
        let validations = validation_records::Entity::find()
            .filter(validation_records::Column::RequestId.eq(request_id))
            .order_by_asc(validation_records::Column::Level)
            .all(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        Ok(RequestDetail {
            request,
            validations,
        })
    }

    /// Records the quantity actually dispensed for a request.
    ///
    /// Only fuelers and admins may record it, and only once the request
    /// has cleared level 2. Recording again overwrites the previous value,
    /// which covers pump corrections.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound` when the request does not exist
    /// - `InactiveActor` when the actor's account is deactivated
    /// - `UnauthorizedTransition` when the actor's role may not record
    ///   served quantities
    /// - `ServedQuantityTooEarly` when the request has not cleared level 2
    /// - `NonPositiveQuantity` when the quantity is zero or negative
    /// - `Store` on database failure
    pub async fn record_served_quantity(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        quantity: Decimal,
    ) -> Result<fuel_requests::Model, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let actor = users::Entity::find_by_id(actor_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or_else(|| WorkflowError::Store(format!("actor {actor_id} missing")))?;
        let actor_role = Role::from(actor.role.clone());

        set_rls_context(&txn, actor_id, actor_role)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        let request = fuel_requests::Entity::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or(WorkflowError::RequestNotFound(request_id))?;

        let status = RequestStatus::from(request.status.clone());

        if !actor.is_active {
            return Err(WorkflowError::InactiveActor(actor_id));
        }
        if !ApprovalEngine::can_record_served(actor_role) {
            return Err(WorkflowError::UnauthorizedTransition {
                status,
                role: actor_role,
            });
        }
        if !status.has_passed_fueling() {
            return Err(WorkflowError::ServedQuantityTooEarly { status });
        }
        if quantity <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveQuantity(quantity));
        }

        let previous = request.quantity_served;
        let mut active: fuel_requests::ActiveModel = request.into();
        active.quantity_served = Set(Some(quantity));
        active.updated_at = Set(Utc::now().into());
        let request = active
            .update(&txn)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        record_in(
            &txn,
            RecordActionInput {
                actor_id,
                action: "fuel_request.served".to_string(),
                entity_type: "fuel_request".to_string(),
                entity_id: request_id,
                detail: Some(json!({
                    "quantity_served": quantity,
                    "previous": previous,
                })),
            },
        )
        .await
        .map_err(|e| WorkflowError::Store(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        Ok(request)
    }

    /// Fetches a request with its decision history, enforcing visibility.
    ///
    /// A driver asking for someone else's request gets `RequestNotFound`;
    /// the response never reveals that the request exists.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` or `Store`.
    pub async fn get(
        &self,
        request_id: Uuid,
        viewer_id: Uuid,
        viewer_role: Role,
    ) -> Result<RequestDetail, WorkflowError> {
        let request = fuel_requests::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or(WorkflowError::RequestNotFound(request_id))?;

        if !ApprovalEngine::can_view(viewer_id, viewer_role, request.requester_id) {
            return Err(WorkflowError::RequestNotFound(request_id));
        }

        let validations = validation_records::Entity::find()
            .filter(validation_records::Column::RequestId.eq(request_id))
            .order_by_asc(validation_records::Column::Level)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?;

        Ok(RequestDetail {
            request,
            validations,
        })
    }

    /// Lists requests visible to the viewer, newest first.
    ///
    /// Drivers see only their own requests; validating and administrative
    /// roles see everything. An optional status filter narrows the list.
    ///
    /// # Errors
    ///
    /// Returns `Store` on database failure.
    pub async fn list(
        &self,
        viewer_id: Uuid,
        viewer_role: Role,
        status: Option<RequestStatus>,
    ) -> Result<Vec<fuel_requests::Model>, WorkflowError> {
        let mut query =
            fuel_requests::Entity::find().order_by_desc(fuel_requests::Column::CreatedAt);

        if !ApprovalEngine::can_view_all(viewer_role) {
            query = query.filter(fuel_requests::Column::RequesterId.eq(viewer_id));
        }
        if let Some(status) = status {
            query = query.filter(
                fuel_requests::Column::Status
                    .eq(sea_orm_active_enums::RequestStatus::from(status)),
            );
        }

        query
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))
    }

    /// Looks up a user's role, for handlers that gate on it.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the user is missing or the query fails.
    pub async fn actor_role(&self, user_id: Uuid) -> Result<(Role, bool), WorkflowError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Store(e.to_string()))?
            .ok_or_else(|| WorkflowError::Store(format!("user {user_id} missing")))?;
        Ok((Role::from(user.role), user.is_active))
    }
}
