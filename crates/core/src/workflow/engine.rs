//! Approval engine: the transition table and role gates.
//!
//! The rule set is encoded as data rather than nested conditionals so it is
//! independently testable and trivially extensible if a validation stage is
//! ever inserted or removed.

use chrono::Utc;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    DecisionAction, DecisionOutcome, RequestStatus, Role, ValidationLevel,
};

/// One row of the transition table.
///
/// A rule says: a request in `from` may be decided by an actor with role
/// `actor`; approval moves it to `next_on_approve`, rejection moves it to
/// `Rejected`, and either way the decision is recorded at `level`.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    /// Status the request must currently be in.
    pub from: RequestStatus,
    /// Role allowed to decide at this stage.
    pub actor: Role,
    /// Status after an approval.
    pub next_on_approve: RequestStatus,
    /// Validation level recorded for the decision.
    pub level: ValidationLevel,
}

/// The complete approval sequence.
///
/// Any (status, role) pair without a row here is an unauthorized transition.
pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: RequestStatus::Pending,
        actor: Role::Supervisor,
        next_on_approve: RequestStatus::SupervisorApproved,
        level: ValidationLevel::Supervisor,
    },
    TransitionRule {
        from: RequestStatus::SupervisorApproved,
        actor: Role::Fueler,
        next_on_approve: RequestStatus::FuelerApproved,
        level: ValidationLevel::Fueler,
    },
    TransitionRule {
        from: RequestStatus::FuelerApproved,
        actor: Role::Director,
        next_on_approve: RequestStatus::DirectorApproved,
        level: ValidationLevel::Director,
    },
];

/// Stateless engine for evaluating approval transitions.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Looks up the transition rule for a (status, role) pair.
    #[must_use]
    pub fn find_rule(current: RequestStatus, actor: Role) -> Option<&'static TransitionRule> {
        TRANSITIONS
            .iter()
            .find(|r| r.from == current && r.actor == actor)
    }

    /// Looks up the stage at which a role decides, if it decides at all.
    ///
    /// Each validating role appears exactly once in the table; drivers
    /// and admins never decide and get `None`.
    #[must_use]
    pub fn rule_for_actor(actor: Role) -> Option<&'static TransitionRule> {
        TRANSITIONS.iter().find(|r| r.actor == actor)
    }

    /// Resolves a decision into a concrete transition.
    ///
    /// # Arguments
    /// * `current` - The request's current status
    /// * `actor_role` - The role of the deciding user
    /// * `outcome` - Approve or reject
    /// * `decided_by` - The deciding user's identity
    /// * `comment` - Optional validator comment
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::UnauthorizedTransition` when the (status,
    /// role) pair has no entry in the transition table. The caller's state
    /// must remain untouched in that case.
    pub fn resolve(
        current: RequestStatus,
        actor_role: Role,
        outcome: DecisionOutcome,
        decided_by: Uuid,
        comment: Option<String>,
    ) -> Result<DecisionAction, WorkflowError> {
        let rule = Self::find_rule(current, actor_role).ok_or(
            WorkflowError::UnauthorizedTransition {
                status: current,
                role: actor_role,
            },
        )?;

        let new_status = match outcome {
            DecisionOutcome::Approved => rule.next_on_approve,
            DecisionOutcome::Rejected => RequestStatus::Rejected,
        };

        Ok(DecisionAction {
            new_status,
            level: rule.level,
            outcome,
            decided_by,
            decided_at: Utc::now(),
            comment,
        })
    }

    /// Checks whether a status transition exists in the table at all,
    /// for any role.
    #[must_use]
    pub fn is_valid_transition(from: RequestStatus, to: RequestStatus) -> bool {
        TRANSITIONS
            .iter()
            .any(|r| r.from == from && (r.next_on_approve == to || to == RequestStatus::Rejected))
            && !from.is_terminal()
    }

    /// Returns true if the role sees every request, not just its own.
    ///
    /// Drivers only ever see requests they authored; all validating and
    /// administrative roles see the full list.
    #[must_use]
    pub const fn can_view_all(role: Role) -> bool {
        match role {
            Role::Driver => false,
            Role::Supervisor | Role::Fueler | Role::Director | Role::Admin => true,
        }
    }

    /// Checks whether `viewer` may see a request authored by `requester`.
    #[must_use]
    pub fn can_view(viewer_id: Uuid, viewer_role: Role, requester_id: Uuid) -> bool {
        Self::can_view_all(viewer_role) || viewer_id == requester_id
    }

    /// Returns true if the role may manage vehicles (create/update/delete).
    #[must_use]
    pub const fn can_manage_vehicles(role: Role) -> bool {
        matches!(role, Role::Admin | Role::Director)
    }

    /// Returns true if the role may manage vehicle types.
    #[must_use]
    pub const fn can_manage_vehicle_types(role: Role) -> bool {
        matches!(role, Role::Admin)
    }

    /// Returns true if the role may manage user accounts.
    #[must_use]
    pub const fn can_manage_users(role: Role) -> bool {
        matches!(role, Role::Admin | Role::Director)
    }

    /// Returns true if the role may record the served fuel quantity on a
    /// request that has cleared level 2.
    #[must_use]
    pub const fn can_record_served(role: Role) -> bool {
        matches!(role, Role::Fueler | Role::Admin)
    }

    /// Returns true if the role may read the audit log.
    #[must_use]
    pub const fn can_view_audit(role: Role) -> bool {
        matches!(role, Role::Admin | Role::Director)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_table_has_three_stages() {
        assert_eq!(TRANSITIONS.len(), 3);
        assert_eq!(TRANSITIONS[0].level, ValidationLevel::Supervisor);
        assert_eq!(TRANSITIONS[1].level, ValidationLevel::Fueler);
        assert_eq!(TRANSITIONS[2].level, ValidationLevel::Director);
    }

    #[test]
    fn test_supervisor_approves_pending() {
        let user_id = Uuid::new_v4();
        let action = ApprovalEngine::resolve(
            RequestStatus::Pending,
            Role::Supervisor,
            DecisionOutcome::Approved,
            user_id,
            None,
        )
        .unwrap();

        assert_eq!(action.new_status, RequestStatus::SupervisorApproved);
        assert_eq!(action.level, ValidationLevel::Supervisor);
        assert_eq!(action.outcome, DecisionOutcome::Approved);
        assert_eq!(action.decided_by, user_id);
    }

    #[test]
    fn test_fueler_approves_supervisor_approved() {
        let action = ApprovalEngine::resolve(
            RequestStatus::SupervisorApproved,
            Role::Fueler,
            DecisionOutcome::Approved,
            Uuid::new_v4(),
            Some("pump 3".to_string()),
        )
        .unwrap();

        assert_eq!(action.new_status, RequestStatus::FuelerApproved);
        assert_eq!(action.level, ValidationLevel::Fueler);
        assert_eq!(action.comment.as_deref(), Some("pump 3"));
    }

    #[test]
    fn test_director_rejects_fueler_approved() {
        let action = ApprovalEngine::resolve(
            RequestStatus::FuelerApproved,
            Role::Director,
            DecisionOutcome::Rejected,
            Uuid::new_v4(),
            None,
        )
        .unwrap();

        assert_eq!(action.new_status, RequestStatus::Rejected);
        assert_eq!(action.level, ValidationLevel::Director);
        assert_eq!(action.outcome, DecisionOutcome::Rejected);
    }

    #[rstest]
    #[case(RequestStatus::Pending, Role::Supervisor, 1)]
    #[case(RequestStatus::SupervisorApproved, Role::Fueler, 2)]
    #[case(RequestStatus::FuelerApproved, Role::Director, 3)]
    fn test_rejection_possible_at_every_stage(
        #[case] status: RequestStatus,
        #[case] role: Role,
        #[case] level: i16,
    ) {
        let action = ApprovalEngine::resolve(
            status,
            role,
            DecisionOutcome::Rejected,
            Uuid::new_v4(),
            None,
        )
        .unwrap();
        assert_eq!(action.new_status, RequestStatus::Rejected);
        assert_eq!(action.level.as_i16(), level);
    }

    #[rstest]
    #[case(Role::Supervisor, Some(ValidationLevel::Supervisor))]
    #[case(Role::Fueler, Some(ValidationLevel::Fueler))]
    #[case(Role::Director, Some(ValidationLevel::Director))]
    #[case(Role::Driver, None)]
    #[case(Role::Admin, None)]
    fn test_rule_for_actor(#[case] role: Role, #[case] level: Option<ValidationLevel>) {
        assert_eq!(ApprovalEngine::rule_for_actor(role).map(|r| r.level), level);
    }

    #[test]
    fn test_fueler_cannot_act_on_pending() {
        let result = ApprovalEngine::resolve(
            RequestStatus::Pending,
            Role::Fueler,
            DecisionOutcome::Approved,
            Uuid::new_v4(),
            None,
        );

        assert!(matches!(
            result,
            Err(WorkflowError::UnauthorizedTransition {
                status: RequestStatus::Pending,
                role: Role::Fueler,
            })
        ));
    }

    #[test]
    fn test_no_transitions_from_terminal_states() {
        for role in Role::all() {
            for status in [RequestStatus::DirectorApproved, RequestStatus::Rejected] {
                for outcome in [DecisionOutcome::Approved, DecisionOutcome::Rejected] {
                    let result =
                        ApprovalEngine::resolve(status, role, outcome, Uuid::new_v4(), None);
                    assert!(
                        matches!(result, Err(WorkflowError::UnauthorizedTransition { .. })),
                        "expected {role} to be denied on {status}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_admin_and_driver_never_decide() {
        for status in RequestStatus::all() {
            for role in [Role::Admin, Role::Driver] {
                let result = ApprovalEngine::resolve(
                    status,
                    role,
                    DecisionOutcome::Approved,
                    Uuid::new_v4(),
                    None,
                );
                assert!(matches!(
                    result,
                    Err(WorkflowError::UnauthorizedTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_only_table_pairs_resolve() {
        // Exhaustively: exactly 3 of the 25 (status, role) pairs may decide.
        let mut allowed = 0;
        for status in RequestStatus::all() {
            for role in Role::all() {
                if ApprovalEngine::find_rule(status, role).is_some() {
                    allowed += 1;
                }
            }
        }
        assert_eq!(allowed, 3);
    }

    #[test]
    fn test_visibility_rules() {
        let driver = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(!ApprovalEngine::can_view_all(Role::Driver));
        assert!(ApprovalEngine::can_view_all(Role::Supervisor));
        assert!(ApprovalEngine::can_view_all(Role::Fueler));
        assert!(ApprovalEngine::can_view_all(Role::Director));
        assert!(ApprovalEngine::can_view_all(Role::Admin));

        assert!(ApprovalEngine::can_view(driver, Role::Driver, driver));
        assert!(!ApprovalEngine::can_view(driver, Role::Driver, other));
        assert!(ApprovalEngine::can_view(other, Role::Supervisor, driver));
    }

    #[test]
    fn test_management_gates() {
        assert!(ApprovalEngine::can_manage_vehicles(Role::Admin));
        assert!(ApprovalEngine::can_manage_vehicles(Role::Director));
        assert!(!ApprovalEngine::can_manage_vehicles(Role::Supervisor));
        assert!(!ApprovalEngine::can_manage_vehicles(Role::Driver));

        assert!(ApprovalEngine::can_manage_vehicle_types(Role::Admin));
        assert!(!ApprovalEngine::can_manage_vehicle_types(Role::Director));

        assert!(ApprovalEngine::can_manage_users(Role::Admin));
        assert!(ApprovalEngine::can_manage_users(Role::Director));
        assert!(!ApprovalEngine::can_manage_users(Role::Fueler));

        assert!(ApprovalEngine::can_record_served(Role::Fueler));
        assert!(ApprovalEngine::can_record_served(Role::Admin));
        assert!(!ApprovalEngine::can_record_served(Role::Driver));
        assert!(!ApprovalEngine::can_record_served(Role::Supervisor));
        assert!(!ApprovalEngine::can_record_served(Role::Director));

        assert!(ApprovalEngine::can_view_audit(Role::Admin));
        assert!(ApprovalEngine::can_view_audit(Role::Director));
        assert!(!ApprovalEngine::can_view_audit(Role::Supervisor));
        assert!(!ApprovalEngine::can_view_audit(Role::Fueler));
        assert!(!ApprovalEngine::can_view_audit(Role::Driver));
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(ApprovalEngine::is_valid_transition(
            RequestStatus::Pending,
            RequestStatus::SupervisorApproved
        ));
        assert!(ApprovalEngine::is_valid_transition(
            RequestStatus::Pending,
            RequestStatus::Rejected
        ));
        assert!(ApprovalEngine::is_valid_transition(
            RequestStatus::FuelerApproved,
            RequestStatus::DirectorApproved
        ));

        // Never backwards, never out of terminal states
        assert!(!ApprovalEngine::is_valid_transition(
            RequestStatus::SupervisorApproved,
            RequestStatus::Pending
        ));
        assert!(!ApprovalEngine::is_valid_transition(
            RequestStatus::Rejected,
            RequestStatus::Pending
        ));
        assert!(!ApprovalEngine::is_valid_transition(
            RequestStatus::DirectorApproved,
            RequestStatus::Rejected
        ));
    }
}
