//! Online/offline sync strategies.
//!
//! # Responsibility
//! - Decide per operation whether a call goes to the backend.
//! - Keep branching out of the services so it can be exercised directly.
//!
//! # Invariants
//! - No reconciliation: temporary-id tasks are never promoted and failed
//!   writes are never retried.

pub mod selector;
pub mod strategy;
