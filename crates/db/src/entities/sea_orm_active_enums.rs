//! Database enum mappings.
//!
//! Conversions to and from the core domain enums live here so repositories
//! never match on raw strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fuel request status (`request_status` Postgres enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "request_status")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting supervisor validation.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Passed level 1.
    #[sea_orm(string_value = "supervisor_approved")]
    SupervisorApproved,
    /// Passed level 2.
    #[sea_orm(string_value = "fueler_approved")]
    FuelerApproved,
    /// Fully approved (terminal).
    #[sea_orm(string_value = "director_approved")]
    DirectorApproved,
    /// Rejected (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<fuelflow_core::workflow::RequestStatus> for RequestStatus {
    fn from(status: fuelflow_core::workflow::RequestStatus) -> Self {
        use fuelflow_core::workflow::RequestStatus as Core;
        match status {
            Core::Pending => Self::Pending,
            Core::SupervisorApproved => Self::SupervisorApproved,
            Core::FuelerApproved => Self::FuelerApproved,
            Core::DirectorApproved => Self::DirectorApproved,
            Core::Rejected => Self::Rejected,
        }
    }
}

impl From<RequestStatus> for fuelflow_core::workflow::RequestStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => Self::Pending,
            RequestStatus::SupervisorApproved => Self::SupervisorApproved,
            RequestStatus::FuelerApproved => Self::FuelerApproved,
            RequestStatus::DirectorApproved => Self::DirectorApproved,
            RequestStatus::Rejected => Self::Rejected,
        }
    }
}

/// User role (`user_role` Postgres enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Submits fuel requests.
    #[sea_orm(string_value = "driver")]
    Driver,
    /// Level 1 validator.
    #[sea_orm(string_value = "supervisor")]
    Supervisor,
    /// Level 2 validator.
    #[sea_orm(string_value = "fueler")]
    Fueler,
    /// Level 3 validator.
    #[sea_orm(string_value = "director")]
    Director,
    /// Administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl From<fuelflow_core::workflow::Role> for UserRole {
    fn from(role: fuelflow_core::workflow::Role) -> Self {
        use fuelflow_core::workflow::Role as Core;
        match role {
            Core::Driver => Self::Driver,
            Core::Supervisor => Self::Supervisor,
            Core::Fueler => Self::Fueler,
            Core::Director => Self::Director,
            Core::Admin => Self::Admin,
        }
    }
}

impl From<UserRole> for fuelflow_core::workflow::Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Driver => Self::Driver,
            UserRole::Supervisor => Self::Supervisor,
            UserRole::Fueler => Self::Fueler,
            UserRole::Director => Self::Director,
            UserRole::Admin => Self::Admin,
        }
    }
}

/// Validation decision outcome (`decision_outcome` Postgres enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "decision_outcome")]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    /// Approved at this level.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected at this level.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<fuelflow_core::workflow::DecisionOutcome> for DecisionOutcome {
    fn from(outcome: fuelflow_core::workflow::DecisionOutcome) -> Self {
        use fuelflow_core::workflow::DecisionOutcome as Core;
        match outcome {
            Core::Approved => Self::Approved,
            Core::Rejected => Self::Rejected,
        }
    }
}

impl From<DecisionOutcome> for fuelflow_core::workflow::DecisionOutcome {
    fn from(outcome: DecisionOutcome) -> Self {
        match outcome {
            DecisionOutcome::Approved => Self::Approved,
            DecisionOutcome::Rejected => Self::Rejected,
        }
    }
}
