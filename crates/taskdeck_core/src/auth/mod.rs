//! Identity provider seam and signup validation.
//!
//! # Responsibility
//! - Model the external identity provider calls as a trait.
//! - Validate signup input before anything reaches the provider.

pub mod identity;
pub mod memory_identity;
pub mod validation;
