//! Backend document store seam.
//!
//! # Responsibility
//! - Define the document-store calls used for tasks and profiles.
//! - Ship an in-process implementation for offline hosts and tests.

pub mod document_store;
pub mod memory_store;
