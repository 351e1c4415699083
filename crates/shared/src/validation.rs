//! Common validation utilities.

use validator::ValidationError;

/// Validates that an explicit consent checkbox was ticked.
pub fn validate_consent(value: bool) -> Result<(), ValidationError> {
    if value {
        Ok(())
    } else {
        let mut err = ValidationError::new("consent_required");
        err.message = Some("You must agree to the terms and conditions".into());
        Err(err)
    }
}

/// Validates that a monetary amount is finite and non-negative.
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be a non-negative number".into());
        Err(err)
    }
}

/// Validates that a string is not blank after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
