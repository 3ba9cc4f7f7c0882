//! Local mirror of the last-known backend state.
//!
//! # Responsibility
//! - Hold the task list, profile and theme when the backend is unreachable.
//! - Stay a flat key-value mirror: no cache policy, no reconciliation.

pub mod local_mirror;
pub mod slot_store;
