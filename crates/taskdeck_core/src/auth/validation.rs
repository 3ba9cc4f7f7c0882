//! Signup form validation.
//!
//! # Invariants
//! - Validation runs before connectivity checks and provider calls.
//! - Passwords shorter than `MIN_PASSWORD_CHARS` are rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Signup form input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupValidationError {
    MissingRequiredFields,
    InvalidEmail(String),
    PasswordMismatch,
    PasswordTooShort { min_chars: usize },
}

impl Display for SignupValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredFields => write!(f, "Please fill in all required fields"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::PasswordMismatch => write!(f, "Passwords do not match"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "Password must be at least {min_chars} characters")
            }
        }
    }
}

impl Error for SignupValidationError {}

impl SignupRequest {
    /// Checks the form in the order the user sees the messages.
    pub fn validate(&self) -> Result<(), SignupValidationError> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(SignupValidationError::MissingRequiredFields);
        }
        let email = self.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(SignupValidationError::InvalidEmail(email.to_string()));
        }
        if self.password != self.confirm_password {
            return Err(SignupValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(SignupValidationError::PasswordTooShort {
                min_chars: MIN_PASSWORD_CHARS,
            });
        }
        Ok(())
    }

    /// Phone with blank input collapsed to `None`.
    pub fn normalized_phone(&self) -> Option<String> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string)
    }
}
