//! Form validation helpers.
//!
//! Input structs derive [`Validate`]; the functions here supply the custom
//! rules the derive cannot express and flatten [`ValidationErrors`] into the
//! field-name → message map that forms render inline.

use crate::errors::{FieldErrors, ServiceError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const GENDERS: [&str; 3] = ["menino", "menina", "unissex"];

/// Exclusive upper bound of the `decimal(10, 2)` money columns.
pub const MAX_AMOUNT: Decimal = dec!(100000000);

/// Money columns keep two decimal places.
pub const AMOUNT_SCALE: u32 = 2;

/// Runs derive-based validation and converts failures into `ServiceError::Validation`.
pub fn validate_form<T: Validate>(form: &T) -> Result<(), ServiceError> {
    form.validate().map_err(ServiceError::from)
}

/// Keeps the first message reported for each field.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect()
}

fn failure(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects amounts the money columns cannot hold.
pub fn amount_fits(label: &str, value: &Decimal) -> Result<(), ValidationError> {
    if *value >= MAX_AMOUNT {
        return Err(failure(
            "amount_too_large",
            format!("{} must be less than {}", label, MAX_AMOUNT),
        ));
    }
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(failure(
            "amount_scale",
            format!("{} must have at most {} decimal places", label, AMOUNT_SCALE),
        ));
    }
    Ok(())
}

pub fn positive_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(failure("price_not_positive", "price must be greater than zero"));
    }
    amount_fits("price", value)
}

pub fn non_negative_cost(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(failure("cost_negative", "cost must not be negative"));
    }
    amount_fits("cost", value)
}

pub fn non_negative_discount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(failure("discount_negative", "discount must not be negative"));
    }
    amount_fits("discount", value)
}

pub fn positive_target(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(failure("target_not_positive", "target must be greater than zero"));
    }
    amount_fits("target", value)
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(failure("blank", "name is required"));
    }
    Ok(())
}

pub fn known_gender(value: &str) -> Result<(), ValidationError> {
    if GENDERS.contains(&value.trim().to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(failure("gender", "gender must be one of: menino, menina, unissex"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_must_be_positive() {
        assert!(positive_price(&dec!(0)).is_err());
        assert!(positive_price(&dec!(-1.50)).is_err());
        assert!(positive_price(&dec!(0.01)).is_ok());
    }

    #[test]
    fn zero_cost_is_allowed() {
        assert!(non_negative_cost(&dec!(0)).is_ok());
        assert!(non_negative_cost(&dec!(-0.01)).is_err());
    }

    #[test]
    fn amounts_must_fit_the_money_columns() {
        let err = positive_price(&dec!(100000000)).unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("price must be less than 100000000")
        );
        assert!(positive_price(&dec!(99999999.99)).is_ok());
        assert!(non_negative_cost(&Decimal::MAX).is_err());
        assert!(non_negative_discount(&dec!(250000000)).is_err());
        assert!(positive_target(&dec!(100000000.00)).is_err());
    }

    #[test]
    fn amounts_keep_two_decimal_places() {
        let err = positive_price(&dec!(10.005)).unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("price must have at most 2 decimal places")
        );
        assert!(positive_price(&dec!(10.500)).is_ok());
        assert!(non_negative_cost(&dec!(0.0001)).is_err());
    }

    #[test]
    fn gender_is_case_insensitive() {
        assert!(known_gender("Menina").is_ok());
        assert!(known_gender("adulto").is_err());
    }
}
