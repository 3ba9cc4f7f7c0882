//! Derived dashboard statistics.
//!
//! # Responsibility
//! - Turn a task collection into summary counts for dashboard widgets.
//!
//! # Invariants
//! - Statistics are never persisted and are recomputed from scratch.

pub mod task_stats;
