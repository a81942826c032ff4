//! Fuel-request approval workflow.
//!
//! The approval chain is a sequential state machine: a driver submits a
//! request in `pending`, a supervisor validates it at level 1, fuel-station
//! staff at level 2, and a director at level 3. Rejection is terminal and
//! possible at every non-terminal stage. The transition rules are encoded
//! as data so the rule set is independently testable.

pub mod engine;
pub mod error;
pub mod submission;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::{ApprovalEngine, TransitionRule, TRANSITIONS};
pub use error::WorkflowError;
pub use submission::SubmitRequestInput;
pub use types::{DecisionAction, DecisionOutcome, RequestStatus, Role, ValidationLevel};
