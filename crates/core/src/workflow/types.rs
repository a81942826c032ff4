//! Workflow domain types for the fuel-request lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fuel request status in the approval chain.
///
/// Requests progress through these states from submission to final approval.
/// The valid transitions are:
/// - Pending → SupervisorApproved (level 1 approve)
/// - SupervisorApproved → FuelerApproved (level 2 approve)
/// - FuelerApproved → DirectorApproved (level 3 approve)
/// - Pending | SupervisorApproved | FuelerApproved → Rejected (reject at
///   the matching level)
///
/// A request never moves backwards, and both `DirectorApproved` and
/// `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted by a driver, awaiting supervisor validation.
    Pending,
    /// Passed level 1 (supervisor), awaiting fuel-station validation.
    SupervisorApproved,
    /// Passed level 2 (fueler), awaiting director validation.
    FuelerApproved,
    /// Passed all three levels (terminal).
    DirectorApproved,
    /// Rejected at some level (terminal).
    Rejected,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SupervisorApproved => "supervisor_approved",
            Self::FuelerApproved => "fueler_approved",
            Self::DirectorApproved => "director_approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "supervisor_approved" => Some(Self::SupervisorApproved),
            "fueler_approved" => Some(Self::FuelerApproved),
            "director_approved" => Some(Self::DirectorApproved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::DirectorApproved | Self::Rejected)
    }

    /// Returns true once the request has cleared level 2, meaning fuel
    /// may already have been dispensed and a served quantity can be
    /// recorded.
    #[must_use]
    pub const fn has_passed_fueling(&self) -> bool {
        matches!(self, Self::FuelerApproved | Self::DirectorApproved)
    }

    /// Returns all statuses, in lifecycle order.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Pending,
            Self::SupervisorApproved,
            Self::FuelerApproved,
            Self::DirectorApproved,
            Self::Rejected,
        ]
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User role in the fleet organization.
///
/// A fixed closed set; every engine operation is gated on the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits fuel requests for vehicles they operate.
    Driver,
    /// Validates requests at level 1.
    Supervisor,
    /// Fuel-station staff; validates requests at level 2.
    Fueler,
    /// Validates requests at level 3 (final approval).
    Director,
    /// Manages users, vehicles, and vehicle types.
    Admin,
}

impl Role {
    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "driver" => Some(Self::Driver),
            "supervisor" => Some(Self::Supervisor),
            "fueler" => Some(Self::Fueler),
            "director" => Some(Self::Director),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Supervisor => "supervisor",
            Self::Fueler => "fueler",
            Self::Director => "director",
            Self::Admin => "admin",
        }
    }

    /// Returns all roles.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Driver,
            Self::Supervisor,
            Self::Fueler,
            Self::Director,
            Self::Admin,
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a validation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    /// The validator approves the request at their level.
    Approved,
    /// The validator rejects the request.
    Rejected,
}

impl DecisionOutcome {
    /// Returns the string representation of the outcome.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses an outcome from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approved" | "approve" => Some(Self::Approved),
            "rejected" | "reject" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordinal validation stage in the approval sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Level 1 - supervisor.
    Supervisor,
    /// Level 2 - fueler (pump operator).
    Fueler,
    /// Level 3 - director.
    Director,
}

impl ValidationLevel {
    /// Returns the numeric level (1-3).
    #[must_use]
    pub const fn as_i16(&self) -> i16 {
        match self {
            Self::Supervisor => 1,
            Self::Fueler => 2,
            Self::Director => 3,
        }
    }

    /// Parses a numeric level (1-3).
    #[must_use]
    pub const fn from_i16(level: i16) -> Option<Self> {
        match level {
            1 => Some(Self::Supervisor),
            2 => Some(Self::Fueler),
            3 => Some(Self::Director),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

/// A resolved state transition with audit data.
///
/// Produced by the engine for every accepted decision; the store applies it
/// atomically as a status update plus one validation record plus one action
/// log entry.
#[derive(Debug, Clone)]
pub struct DecisionAction {
    /// The status after the transition.
    pub new_status: RequestStatus,
    /// The validation level of this decision.
    pub level: ValidationLevel,
    /// The decision outcome.
    pub outcome: DecisionOutcome,
    /// The validator who made the decision.
    pub decided_by: Uuid,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
    /// Optional comment from the validator.
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(RequestStatus::Pending.as_str(), "pending");
        assert_eq!(
            RequestStatus::SupervisorApproved.as_str(),
            "supervisor_approved"
        );
        assert_eq!(RequestStatus::FuelerApproved.as_str(), "fueler_approved");
        assert_eq!(
            RequestStatus::DirectorApproved.as_str(),
            "director_approved"
        );
        assert_eq!(RequestStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            RequestStatus::parse("pending"),
            Some(RequestStatus::Pending)
        );
        assert_eq!(
            RequestStatus::parse("SUPERVISOR_APPROVED"),
            Some(RequestStatus::SupervisorApproved)
        );
        assert_eq!(
            RequestStatus::parse("Rejected"),
            Some(RequestStatus::Rejected)
        );
        assert_eq!(RequestStatus::parse("draft"), None);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in RequestStatus::all() {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::SupervisorApproved.is_terminal());
        assert!(!RequestStatus::FuelerApproved.is_terminal());
        assert!(RequestStatus::DirectorApproved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_has_passed_fueling() {
        assert!(!RequestStatus::Pending.has_passed_fueling());
        assert!(!RequestStatus::SupervisorApproved.has_passed_fueling());
        assert!(!RequestStatus::Rejected.has_passed_fueling());
        assert!(RequestStatus::FuelerApproved.has_passed_fueling());
        assert!(RequestStatus::DirectorApproved.has_passed_fueling());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("driver"), Some(Role::Driver));
        assert_eq!(Role::parse("SUPERVISOR"), Some(Role::Supervisor));
        assert_eq!(Role::parse("Fueler"), Some(Role::Fueler));
        assert_eq!(Role::parse("director"), Some(Role::Director));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in Role::all() {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!(
            DecisionOutcome::parse("approve"),
            Some(DecisionOutcome::Approved)
        );
        assert_eq!(
            DecisionOutcome::parse("approved"),
            Some(DecisionOutcome::Approved)
        );
        assert_eq!(
            DecisionOutcome::parse("reject"),
            Some(DecisionOutcome::Rejected)
        );
        assert_eq!(DecisionOutcome::parse("maybe"), None);
    }

    #[test]
    fn test_validation_level_numeric() {
        assert_eq!(ValidationLevel::Supervisor.as_i16(), 1);
        assert_eq!(ValidationLevel::Fueler.as_i16(), 2);
        assert_eq!(ValidationLevel::Director.as_i16(), 3);

        assert_eq!(ValidationLevel::from_i16(1), Some(ValidationLevel::Supervisor));
        assert_eq!(ValidationLevel::from_i16(2), Some(ValidationLevel::Fueler));
        assert_eq!(ValidationLevel::from_i16(3), Some(ValidationLevel::Director));
        assert_eq!(ValidationLevel::from_i16(0), None);
        assert_eq!(ValidationLevel::from_i16(4), None);
    }

    #[test]
    fn test_validation_level_ordering() {
        assert!(ValidationLevel::Supervisor < ValidationLevel::Fueler);
        assert!(ValidationLevel::Fueler < ValidationLevel::Director);
    }
}
