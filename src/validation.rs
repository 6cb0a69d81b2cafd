//! Input validation for request payloads.
//!
//! Payload types implement [`Validatable`] and collect every failing rule into
//! [`ValidationErrors`], which handlers turn into a 422 response.

use regex::Regex;
use serde::Serialize;
use std::{fmt, sync::LazyLock};

static USERNAME_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("valid username regex"));

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").expect("valid email regex")
});

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the error of a failed rule, ignore a passing one.
    pub fn check(&mut self, outcome: Result<(), ValidationError>) {
        if let Err(error) = outcome {
            self.add(error);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Convert to Result
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one rule failed.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Types checked before they reach the database.
pub trait Validatable {
    /// # Errors
    ///
    /// Returns every rule that failed.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Helper validators for common patterns
pub mod validators {
    use super::{EMAIL_SHAPE, USERNAME_SHAPE, ValidationError};

    /// Validate character count is within range
    ///
    /// # Errors
    ///
    /// Fails when `value` is shorter than `min` or longer than `max`.
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();

        if let Some(min_len) = min.filter(|&min_len| len < min_len) {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_len} characters"),
            ));
        }

        if let Some(max_len) = max.filter(|&max_len| len > max_len) {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_len} characters"),
            ));
        }

        Ok(())
    }

    /// Validate value is not blank
    ///
    /// # Errors
    ///
    /// Fails for empty or whitespace-only input.
    pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "This field is required"));
        }
        Ok(())
    }

    /// Expects an already trimmed and lowercased address.
    ///
    /// # Errors
    ///
    /// Fails when the address does not look like `local@domain.tld`.
    pub fn validate_email(field: &str, value: &str) -> Result<(), ValidationError> {
        if value.len() > 255 {
            return Err(ValidationError::new(
                field,
                "Email must be at most 255 characters",
            ));
        }
        if !EMAIL_SHAPE.is_match(value) {
            return Err(ValidationError::new(field, "Invalid email format"));
        }
        Ok(())
    }

    /// 3 to 30 letters, digits, underscores or hyphens.
    ///
    /// # Errors
    ///
    /// Fails for any other shape.
    pub fn validate_username(field: &str, value: &str) -> Result<(), ValidationError> {
        if USERNAME_SHAPE.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::new(
                field,
                "Username must be 3 to 30 characters of letters, digits, '_' or '-'",
            ))
        }
    }

    /// At least 8 characters with upper and lower case letters, a digit and a symbol.
    ///
    /// # Errors
    ///
    /// Reports the first missing requirement.
    pub fn validate_password(field: &str, value: &str) -> Result<(), ValidationError> {
        validate_length(field, value, Some(8), Some(128))?;

        let rules: [(fn(char) -> bool, &str); 4] = [
            (char::is_uppercase, "Password must contain an uppercase letter"),
            (char::is_lowercase, "Password must contain a lowercase letter"),
            (|c: char| c.is_ascii_digit(), "Password must contain a digit"),
            (
                |c: char| !c.is_alphanumeric() && !c.is_whitespace(),
                "Password must contain a special character",
            ),
        ];

        for (predicate, message) in rules {
            if !value.chars().any(predicate) {
                return Err(ValidationError::new(field, message));
            }
        }
        Ok(())
    }
}
