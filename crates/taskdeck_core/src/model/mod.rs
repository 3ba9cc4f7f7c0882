//! Domain model for tasks and user profiles.
//!
//! # Responsibility
//! - Define the canonical records shared by the mirror, the remote store and
//!   the statistics aggregator.
//! - Keep serialized names aligned with the backend document schema.
//!
//! # Invariants
//! - Every task is owned by exactly one user (`user_id`).
//! - Temporary task ids carry the `temp_` prefix and never come from the
//!   remote store.

pub mod profile;
pub mod task;
