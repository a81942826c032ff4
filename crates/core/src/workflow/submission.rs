//! Submission input and validation.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::Role;

/// Input for submitting a new fuel request.
///
/// Validation here is purely structural; referential checks (the vehicle
/// exists and is active) happen against a snapshot the caller provides.
#[derive(Debug, Clone)]
pub struct SubmitRequestInput {
    /// Vehicle the fuel is requested for.
    pub vehicle_id: Uuid,
    /// Requested volume in liters.
    pub quantity_requested: Decimal,
    /// Odometer reading at submission time, in kilometers.
    pub odometer_km: i64,
    /// Site the vehicle operates from.
    pub site: String,
    /// Free-text mission description.
    pub mission: String,
    /// Why the fuel is needed.
    pub justification: String,
}

impl SubmitRequestInput {
    /// Validates the submission against the requester and the vehicle
    /// snapshot the caller looked up.
    ///
    /// `vehicle` is `None` when the referenced vehicle does not exist;
    /// `Some(is_active)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first failing check. Field checks run before
    /// referential checks so a malformed request never reports a
    /// vehicle error.
    pub fn validate(
        &self,
        requester_role: Role,
        vehicle: Option<bool>,
    ) -> Result<(), WorkflowError> {
        if requester_role != Role::Driver {
            return Err(WorkflowError::RequesterNotDriver {
                role: requester_role,
            });
        }

        for (field, value) in [
            ("site", &self.site),
            ("mission", &self.mission),
            ("justification", &self.justification),
        ] {
            if value.trim().is_empty() {
                return Err(WorkflowError::BlankField { field });
            }
        }

        if self.odometer_km < 0 {
            return Err(WorkflowError::NegativeOdometer(self.odometer_km));
        }

        if self.quantity_requested <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveQuantity(self.quantity_requested));
        }

        match vehicle {
            None => Err(WorkflowError::VehicleNotFound(self.vehicle_id)),
            Some(false) => Err(WorkflowError::VehicleInactive(self.vehicle_id)),
            Some(true) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_input() -> SubmitRequestInput {
        SubmitRequestInput {
            vehicle_id: Uuid::new_v4(),
            quantity_requested: dec!(45.5),
            odometer_km: 120_340,
            site: "North depot".to_string(),
            mission: "Delivery run to the north depot".to_string(),
            justification: "Routine weekly resupply".to_string(),
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(valid_input().validate(Role::Driver, Some(true)).is_ok());
    }

    #[test]
    fn test_only_drivers_submit() {
        for role in [Role::Supervisor, Role::Fueler, Role::Director, Role::Admin] {
            let result = valid_input().validate(role, Some(true));
            assert!(matches!(
                result,
                Err(WorkflowError::RequesterNotDriver { .. })
            ));
        }
    }

    #[test]
    fn test_blank_text_fields_rejected() {
        let mut input = valid_input();
        input.site = "   ".to_string();
        assert!(matches!(
            input.validate(Role::Driver, Some(true)),
            Err(WorkflowError::BlankField { field: "site" })
        ));

        let mut input = valid_input();
        input.mission = String::new();
        assert!(matches!(
            input.validate(Role::Driver, Some(true)),
            Err(WorkflowError::BlankField { field: "mission" })
        ));

        let mut input = valid_input();
        input.justification = "\t".to_string();
        assert!(matches!(
            input.validate(Role::Driver, Some(true)),
            Err(WorkflowError::BlankField {
                field: "justification"
            })
        ));
    }

    #[test]
    fn test_negative_odometer_rejected() {
        let mut input = valid_input();
        input.odometer_km = -1;
        assert!(matches!(
            input.validate(Role::Driver, Some(true)),
            Err(WorkflowError::NegativeOdometer(-1))
        ));
    }

    #[test]
    fn test_zero_odometer_allowed() {
        let mut input = valid_input();
        input.odometer_km = 0;
        assert!(input.validate(Role::Driver, Some(true)).is_ok());
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut input = valid_input();
        input.quantity_requested = Decimal::ZERO;
        assert!(matches!(
            input.validate(Role::Driver, Some(true)),
            Err(WorkflowError::NonPositiveQuantity(_))
        ));

        input.quantity_requested = dec!(-3.2);
        assert!(matches!(
            input.validate(Role::Driver, Some(true)),
            Err(WorkflowError::NonPositiveQuantity(_))
        ));
    }

    #[test]
    fn test_missing_vehicle_rejected() {
        let input = valid_input();
        assert!(matches!(
            input.validate(Role::Driver, None),
            Err(WorkflowError::VehicleNotFound(id)) if id == input.vehicle_id
        ));
    }

    #[test]
    fn test_inactive_vehicle_rejected() {
        let input = valid_input();
        assert!(matches!(
            input.validate(Role::Driver, Some(false)),
            Err(WorkflowError::VehicleInactive(id)) if id == input.vehicle_id
        ));
    }

    #[test]
    fn test_field_checks_run_before_vehicle_checks() {
        let mut input = valid_input();
        input.mission = String::new();
        // Vehicle missing too, but the blank field wins.
        assert!(matches!(
            input.validate(Role::Driver, None),
            Err(WorkflowError::BlankField { field: "mission" })
        ));
    }
}
