//! Property-based tests for the approval engine.

use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::engine::{ApprovalEngine, TRANSITIONS};
use crate::workflow::types::{DecisionOutcome, RequestStatus, Role};

fn any_status() -> impl Strategy<Value = RequestStatus> {
    prop::sample::select(RequestStatus::all().to_vec())
}

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::all().to_vec())
}

fn any_outcome() -> impl Strategy<Value = DecisionOutcome> {
    prop::sample::select(vec![DecisionOutcome::Approved, DecisionOutcome::Rejected])
}

proptest! {
    /// Every accepted decision corresponds to exactly one table row, and
    /// the action it produces matches that row.
    #[test]
    fn resolved_decisions_match_the_table(
        status in any_status(),
        role in any_role(),
        outcome in any_outcome(),
        comment in prop::option::of(".{0,64}"),
    ) {
        let decided_by = Uuid::new_v4();
        let result = ApprovalEngine::resolve(status, role, outcome, decided_by, comment.clone());

        match result {
            Ok(action) => {
                let rule = TRANSITIONS
                    .iter()
                    .find(|r| r.from == status && r.actor == role)
                    .expect("accepted decision must have a table row");

                prop_assert_eq!(action.level, rule.level);
                prop_assert_eq!(action.outcome, outcome);
                prop_assert_eq!(action.decided_by, decided_by);
                prop_assert_eq!(action.comment, comment);
                match outcome {
                    DecisionOutcome::Approved => {
                        prop_assert_eq!(action.new_status, rule.next_on_approve);
                    }
                    DecisionOutcome::Rejected => {
                        prop_assert_eq!(action.new_status, RequestStatus::Rejected);
                    }
                }
            }
            Err(_) => {
                prop_assert!(
                    !TRANSITIONS.iter().any(|r| r.from == status && r.actor == role),
                    "rejected decision must not have a table row"
                );
            }
        }
    }

    /// Approvals always move strictly forward, never to or from a
    /// terminal state other than the final one.
    #[test]
    fn approvals_move_forward(status in any_status(), role in any_role()) {
        if let Ok(action) = ApprovalEngine::resolve(
            status,
            role,
            DecisionOutcome::Approved,
            Uuid::new_v4(),
            None,
        ) {
            prop_assert!(!status.is_terminal());
            prop_assert_ne!(action.new_status, status);
            prop_assert_ne!(action.new_status, RequestStatus::Pending);
        }
    }

    /// Rejection from any non-terminal state lands in Rejected.
    #[test]
    fn rejections_are_terminal(status in any_status(), role in any_role()) {
        if let Ok(action) = ApprovalEngine::resolve(
            status,
            role,
            DecisionOutcome::Rejected,
            Uuid::new_v4(),
            None,
        ) {
            prop_assert_eq!(action.new_status, RequestStatus::Rejected);
            prop_assert!(action.new_status.is_terminal());
        }
    }
}
