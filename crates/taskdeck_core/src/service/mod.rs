//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate strategies, the mirror and the identity provider into
//!   use-case level APIs.
//! - Receive session and theme state explicitly instead of looking it up.

pub mod auth_service;
pub mod task_service;
pub mod theme_service;
