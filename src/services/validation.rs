//! Request body validation for the auth endpoints.
//!
//! Failures are reported as `field: message[, message]` pairs joined by `; `.

use std::collections::BTreeMap;

use crate::models::{LoginRequest, RegisterRequest};
use crate::utils::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Default)]
struct Violations(BTreeMap<&'static str, Vec<&'static str>>);

impl Violations {
    fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_default().push(message);
    }

    fn into_result(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            return Ok(());
        }
        let message = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation(message))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

fn check_email(email: &str, violations: &mut Violations) {
    if email.trim().is_empty() {
        violations.add("email", "Email is required");
    } else if !is_valid_email(email.trim()) {
        violations.add("email", "Not a valid email address");
    }
}

pub fn validate_login(request: &LoginRequest) -> Result<(), AppError> {
    let mut violations = Violations::default();
    check_email(&request.email, &mut violations);
    if request.password.is_empty() {
        violations.add("password", "Password is required");
    }
    violations.into_result()
}

pub fn validate_register(request: &RegisterRequest) -> Result<(), AppError> {
    let mut violations = Violations::default();
    check_email(&request.email, &mut violations);

    if request.password.is_empty() {
        violations.add("password", "Password is required");
    } else if request.password.chars().count() < MIN_PASSWORD_LEN {
        violations.add("password", "Password must be at least 6 characters long");
    }

    if request.confirm_password.is_empty() {
        violations.add("confirmPassword", "Missing data for required field");
    } else if request.password != request.confirm_password {
        violations.add("confirmPassword", "Passwords do not match");
    }

    violations.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("ravi@prepwise.in"));
        assert!(!is_valid_email("ravi"));
        assert!(!is_valid_email("@prepwise.in"));
        assert!(!is_valid_email("ravi@prepwise"));
        assert!(!is_valid_email("ravi@@prepwise.in"));
        assert!(!is_valid_email("ra vi@prepwise.in"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let err = validate_login(&LoginRequest::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "email: Email is required; password: Password is required"
        );
    }

    #[test]
    fn test_login_accepts_any_non_empty_password() {
        let request = LoginRequest {
            email: "ravi@prepwise.in".into(),
            password: "x".into(),
        };
        assert!(validate_login(&request).is_ok());
    }

    #[test]
    fn test_register_short_password() {
        let err = validate_register(&register("ravi@prepwise.in", "abc", "abc")).unwrap_err();
        assert_eq!(err.to_string(), "password: Password must be at least 6 characters long");
    }

    #[test]
    fn test_register_mismatch() {
        let err =
            validate_register(&register("ravi@prepwise.in", "secret1", "secret2")).unwrap_err();
        assert_eq!(err.to_string(), "confirmPassword: Passwords do not match");
    }

    #[test]
    fn test_register_valid() {
        assert!(validate_register(&register("ravi@prepwise.in", "secret1", "secret1")).is_ok());
    }
}
