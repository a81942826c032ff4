//! Workflow error types for the fuel-request lifecycle.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::{RequestStatus, Role};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Only drivers may submit fuel requests.
    #[error("only drivers may submit fuel requests, caller role is {role}")]
    RequesterNotDriver {
        /// The caller's actual role.
        role: Role,
    },

    /// The acting account has been deactivated.
    #[error("account {0} is deactivated")]
    InactiveActor(Uuid),

    /// The referenced vehicle does not exist.
    #[error("vehicle {0} not found")]
    VehicleNotFound(Uuid),

    /// The referenced vehicle is not active.
    #[error("vehicle {0} is not active")]
    VehicleInactive(Uuid),

    /// Odometer reading must be non-negative.
    #[error("odometer reading {0} is negative")]
    NegativeOdometer(i64),

    /// Requested quantity must be strictly positive.
    #[error("requested quantity {0} is not positive")]
    NonPositiveQuantity(Decimal),

    /// A required text field is missing or blank.
    #[error("field '{field}' must not be blank")]
    BlankField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The (status, role) pair has no entry in the transition table.
    #[error("role {role} may not act on a request in status {status}")]
    UnauthorizedTransition {
        /// The request's current status.
        status: RequestStatus,
        /// The acting role.
        role: Role,
    },

    /// Served quantity may only be recorded once the request cleared
    /// level 2.
    #[error("served quantity cannot be recorded while the request is {status}")]
    ServedQuantityTooEarly {
        /// The request's current status.
        status: RequestStatus,
    },

    /// Fuel request not found.
    #[error("fuel request {0} not found")]
    RequestNotFound(Uuid),

    /// Lost a concurrent race: the request moved on since it was read.
    ///
    /// The caller should refresh and re-evaluate; the decision was NOT
    /// applied and no validation record was written.
    #[error("fuel request {request_id} was concurrently updated (now {status})")]
    StaleTransition {
        /// The contested request.
        request_id: Uuid,
        /// The status observed after losing the race.
        status: RequestStatus,
    },

    /// Transient store failure; the caller may retry.
    #[error("store error: {0}")]
    Store(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::RequesterNotDriver { .. }
            | Self::VehicleInactive(_)
            | Self::NegativeOdometer(_)
            | Self::NonPositiveQuantity(_)
            | Self::BlankField { .. } => 400,

            Self::ServedQuantityTooEarly { .. } => 409,

            Self::InactiveActor(_) | Self::UnauthorizedTransition { .. } => 403,

            Self::RequestNotFound(_) | Self::VehicleNotFound(_) => 404,

            Self::StaleTransition { .. } => 409,

            Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RequesterNotDriver { .. } => "REQUESTER_NOT_DRIVER",
            Self::VehicleNotFound(_) => "VEHICLE_NOT_FOUND",
            Self::VehicleInactive(_) => "VEHICLE_INACTIVE",
            Self::NegativeOdometer(_) => "NEGATIVE_ODOMETER",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::BlankField { .. } => "BLANK_FIELD",
            Self::InactiveActor(_) => "INACTIVE_ACTOR",
            Self::ServedQuantityTooEarly { .. } => "SERVED_QUANTITY_TOO_EARLY",
            Self::UnauthorizedTransition { .. } => "UNAUTHORIZED_TRANSITION",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::StaleTransition { .. } => "STALE_TRANSITION",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_transition_error() {
        let err = WorkflowError::UnauthorizedTransition {
            status: RequestStatus::Pending,
            role: Role::Fueler,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "UNAUTHORIZED_TRANSITION");
        assert!(err.to_string().contains("pending"));
        assert!(err.to_string().contains("fueler"));
    }

    #[test]
    fn test_request_not_found_error() {
        let err = WorkflowError::RequestNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "REQUEST_NOT_FOUND");
    }

    #[test]
    fn test_stale_transition_error() {
        let err = WorkflowError::StaleTransition {
            request_id: Uuid::nil(),
            status: RequestStatus::SupervisorApproved,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "STALE_TRANSITION");
    }

    #[test]
    fn test_validation_errors_are_bad_request() {
        let err = WorkflowError::RequesterNotDriver { role: Role::Admin };
        assert_eq!(err.status_code(), 400);

        let err = WorkflowError::NegativeOdometer(-5);
        assert_eq!(err.status_code(), 400);

        let err = WorkflowError::NonPositiveQuantity(Decimal::ZERO);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "NON_POSITIVE_QUANTITY");

        let err = WorkflowError::VehicleInactive(Uuid::nil());
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_inactive_actor_error() {
        let err = WorkflowError::InactiveActor(Uuid::nil());
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "INACTIVE_ACTOR");
        assert!(err.to_string().contains("deactivated"));
    }

    #[test]
    fn test_served_quantity_too_early_error() {
        let err = WorkflowError::ServedQuantityTooEarly {
            status: RequestStatus::Pending,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "SERVED_QUANTITY_TOO_EARLY");
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn test_vehicle_not_found_error() {
        let err = WorkflowError::VehicleNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "VEHICLE_NOT_FOUND");
    }

    #[test]
    fn test_store_error() {
        let err = WorkflowError::Store("connection reset".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "STORE_ERROR");
    }
}
