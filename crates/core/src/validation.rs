//! Form validation.
//!
//! Each form the shop submits has an input type implementing [`Validate`].
//! Validation is a pure function from input to [`FieldErrors`]; callers run
//! it before dispatching or calling the shop API and render the errors next
//! to the offending fields.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::cart::ShippingAddress;
use crate::types::Email;

/// Minimum password length accepted by the shop API.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Field name → error message. Empty means the input is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field. The first error per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Error message for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise the errors.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed validation.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FieldErrors {}

/// A form input that can be checked before submission.
pub trait Validate {
    /// Collect every field error in the input.
    fn validate(&self) -> FieldErrors;

    /// Shorthand for `self.validate().into_result()`.
    ///
    /// # Errors
    ///
    /// Returns the field errors if the input is invalid.
    fn check(&self) -> Result<(), FieldErrors> {
        self.validate().into_result()
    }
}

/// Sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        check_password(&mut errors, "password", &self.password);
        errors
    }
}

/// Account creation form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for RegisterInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "name", &self.name, "Please enter name");
        check_email(&mut errors, &self.email);
        check_password(&mut errors, "password", &self.password);
        check_password(&mut errors, "confirmPassword", &self.confirm_password);
        if self.confirm_password != self.password {
            errors.add("confirmPassword", "Passwords do not match");
        }
        errors
    }
}

/// Profile update form. Same rules as registration: the API signs the user
/// back in with the new password, so one is always required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for ProfileInput {
    fn validate(&self) -> FieldErrors {
        RegisterInput {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        }
        .validate()
    }
}

impl Validate for ShippingAddress {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "fullName", &self.full_name, "Please enter full name");
        check_required(&mut errors, "address", &self.address, "Please enter address");
        check_required(&mut errors, "city", &self.city, "Please enter city");
        check_required(
            &mut errors,
            "postalCode",
            &self.postal_code,
            "Please enter postal code",
        );
        check_required(&mut errors, "country", &self.country, "Please enter country");
        errors
    }
}

/// Payment method selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub payment_method: String,
}

impl Validate for PaymentInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_required(
            &mut errors,
            "paymentMethod",
            &self.payment_method,
            "Please select payment method",
        );
        errors
    }
}

/// Parse a requested quantity.
///
/// # Errors
///
/// Returns a `quantity` field error for zero.
pub fn parse_quantity(quantity: u32) -> Result<NonZeroU32, FieldErrors> {
    NonZeroU32::new(quantity).ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.add("quantity", "Quantity must be at least 1");
        errors
    })
}

fn check_required(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "Please enter email");
    } else if Email::parse(email).is_err() {
        errors.add("email", "Please enter valid email");
    }
}

fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.is_empty() {
        errors.add(field, "Please enter password");
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn register(password: &str, confirm: &str) -> RegisterInput {
        RegisterInput {
            name: "Bold".to_owned(),
            email: "bold@example.com".to_owned(),
            password: password.to_owned(),
            confirm_password: confirm.to_owned(),
        }
    }

    #[test]
    fn test_valid_login() {
        let input = LoginInput {
            email: "user@example.com".to_owned(),
            password: "123456".to_owned(),
        };
        assert!(input.check().is_ok());
    }

    #[test]
    fn test_login_reports_each_field() {
        let input = LoginInput {
            email: "not-an-email".to_owned(),
            password: "12345".to_owned(),
        };
        let errors = input.validate();
        assert_eq!(errors.get("email"), Some("Please enter valid email"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
    }

    #[test]
    fn test_login_missing_fields() {
        let input = LoginInput {
            email: "  ".to_owned(),
            password: String::new(),
        };
        let errors = input.validate();
        assert_eq!(errors.get("email"), Some("Please enter email"));
        assert_eq!(errors.get("password"), Some("Please enter password"));
    }

    #[test]
    fn test_register_password_mismatch() {
        let errors = register("secret1", "secret2").validate();
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
        assert!(errors.get("password").is_none());
    }

    #[test]
    fn test_register_short_confirmation_reports_length_first() {
        let errors = register("secret1", "abc").validate();
        assert_eq!(
            errors.get("confirmPassword"),
            Some("Password must be at least 6 characters")
        );
    }

    #[test]
    fn test_register_requires_name() {
        let mut input = register("secret1", "secret1");
        input.name = " ".to_owned();
        assert_eq!(input.validate().get("name"), Some("Please enter name"));
    }

    #[test]
    fn test_profile_uses_register_rules() {
        let input = ProfileInput {
            name: "Bold".to_owned(),
            email: "bold@example.com".to_owned(),
            password: "secret1".to_owned(),
            confirm_password: "secret1".to_owned(),
        };
        assert!(input.check().is_ok());
    }

    #[test]
    fn test_shipping_address_requires_every_field() {
        let address = ShippingAddress {
            full_name: "Bold Bat".to_owned(),
            address: String::new(),
            city: "Ulaanbaatar".to_owned(),
            postal_code: " ".to_owned(),
            country: "Mongolia".to_owned(),
        };
        let errors = address.validate();
        let fields: Vec<_> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, ["address", "postalCode"]);
    }

    #[test]
    fn test_payment_method_required() {
        let input = PaymentInput {
            payment_method: String::new(),
        };
        assert!(input.check().is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(3).unwrap().get(), 3);
        let errors = parse_quantity(0).unwrap_err();
        assert!(errors.get("quantity").is_some());
    }

    #[test]
    fn test_field_errors_serialize_as_object() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Please enter email");
        errors.add("email", "ignored");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "Please enter email" }));
        assert_eq!(errors.to_string(), "email: Please enter email");
    }
}
