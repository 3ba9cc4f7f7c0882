//! Core domain logic for TaskDeck.
//! Owns task sync, the offline mirror, dashboard statistics and the theme
//! preference; hosts only render what these services expose.

pub mod auth;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod remote;
pub mod service;
pub mod stats;
pub mod sync;

pub use auth::identity::{AuthError, AuthResult, AuthUser, IdentityProvider, SocialProvider};
pub use auth::memory_identity::MemoryIdentityProvider;
pub use auth::validation::{SignupRequest, SignupValidationError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use connectivity::{Connectivity, ConnectivityFlag};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status, LogLevel};
pub use mirror::local_mirror::LocalMirror;
pub use mirror::slot_store::{
    MemorySlotStore, MirrorError, MirrorResult, Slot, SlotStore, SqliteSlotStore,
};
pub use model::profile::{Theme, UserProfile};
pub use model::task::{
    is_temporary_id, Priority, SubTask, Task, TaskCategory, TaskDraft, TaskFilter, TaskId,
    TaskPatch, TaskStatus, TaskValidationError, Timeframe,
};
pub use remote::document_store::{
    DocumentStore, RemoteError, RemoteOp, RemoteResult, Subscription, TaskListener,
};
pub use remote::memory_store::{MemoryDocumentStore, RemoteCall};
pub use service::auth_service::{AuthService, Session};
pub use service::task_service::{DataSource, TaskService, TaskServiceError, TaskServiceResult};
pub use service::theme_service::ThemeStore;
pub use stats::task_stats::{compute_stats, TaskStats};
pub use sync::selector::StrategySelector;
pub use sync::strategy::{LocalOnly, RemoteBacked, SyncError, SyncResult, SyncStrategy};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
