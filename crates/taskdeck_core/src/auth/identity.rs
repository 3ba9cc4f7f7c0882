//! Identity provider contract.
//!
//! # Responsibility
//! - Describe the login/signup/logout/session calls made to the external
//!   identity provider.
//!
//! # Invariants
//! - The provider's session object is trusted as-is.

use crate::auth::validation::SignupValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Supported social sign-in providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SocialProvider {
    Google,
    Github,
}

impl SocialProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

/// Auth flow failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The flow needs the identity provider and the client is offline.
    OfflineRequired(&'static str),
    /// Form input rejected before any provider call.
    Validation(SignupValidationError),
    InvalidCredentials,
    EmailInUse(String),
    /// Any other provider failure.
    Provider(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OfflineRequired(message) => write!(f, "{message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::EmailInUse(email) => write!(f, "email already in use: {email}"),
            Self::Provider(message) => write!(f, "identity provider error: {message}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SignupValidationError> for AuthError {
    fn from(value: SignupValidationError) -> Self {
        Self::Validation(value)
    }
}

/// External identity provider.
pub trait IdentityProvider: Send + Sync {
    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthUser>;
    fn create_user(&self, email: &str, password: &str) -> AuthResult<AuthUser>;
    fn sign_in_with_social(&self, provider: SocialProvider) -> AuthResult<AuthUser>;
    fn update_display_name(&self, uid: &str, display_name: &str) -> AuthResult<AuthUser>;
    fn sign_out(&self) -> AuthResult<()>;
    /// Currently signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;
}
