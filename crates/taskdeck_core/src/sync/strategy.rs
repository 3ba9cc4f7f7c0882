//! Sync strategies for task writes and reads.
//!
//! # Responsibility
//! - Isolate the online/offline branch behind one interface.
//! - Refuse remote calls for ids that never reached the backend.
//!
//! # Invariants
//! - `LocalOnly` never calls the document store.
//! - `RemoteBacked` never sends a temporary id to the document store.

use crate::model::task::{is_temporary_id, Task, TaskId, TaskPatch};
use crate::remote::document_store::{DocumentStore, RemoteError, Subscription, TaskListener};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SyncResult<T> = Result<T, SyncError>;

/// Why a strategy did not complete a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The client is offline; nothing was sent.
    Offline,
    /// The id only exists locally; nothing was sent.
    TemporaryId(TaskId),
    /// The backend rejected or failed the call.
    Remote(RemoteError),
}

impl SyncError {
    /// Whether the backend was actually contacted and failed.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Offline => "offline",
            Self::TemporaryId(_) => "temporary_id",
            Self::Remote(err) => err.code.as_str(),
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "client is offline"),
            Self::TemporaryId(id) => write!(f, "task `{id}` has not been synced"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// One way of reaching (or not reaching) the backend.
pub trait SyncStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn subscribe(&self, owner_id: &str, listener: TaskListener) -> SyncResult<Subscription>;
    /// Returns the backend-assigned id.
    fn push_create(&self, task: &Task) -> SyncResult<TaskId>;
    fn push_update(&self, id: &str, patch: &TaskPatch, updated_at: i64) -> SyncResult<()>;
    fn push_delete(&self, id: &str) -> SyncResult<()>;
}

/// Forwards every call to the document store.
pub struct RemoteBacked {
    store: Arc<dyn DocumentStore>,
}

impl RemoteBacked {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn reject_temporary(id: &str) -> SyncResult<()> {
        if is_temporary_id(id) {
            return Err(SyncError::TemporaryId(id.to_string()));
        }
        Ok(())
    }
}

impl SyncStrategy for RemoteBacked {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn subscribe(&self, owner_id: &str, listener: TaskListener) -> SyncResult<Subscription> {
        Ok(self.store.subscribe_tasks(owner_id, listener)?)
    }

    fn push_create(&self, task: &Task) -> SyncResult<TaskId> {
        Ok(self.store.add_task(task)?)
    }

    fn push_update(&self, id: &str, patch: &TaskPatch, updated_at: i64) -> SyncResult<()> {
        Self::reject_temporary(id)?;
        Ok(self.store.update_task(id, patch, updated_at)?)
    }

    fn push_delete(&self, id: &str) -> SyncResult<()> {
        Self::reject_temporary(id)?;
        Ok(self.store.delete_task(id)?)
    }
}

/// Never leaves the device.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnly;

impl SyncStrategy for LocalOnly {
    fn name(&self) -> &'static str {
        "local"
    }

    fn subscribe(&self, _owner_id: &str, _listener: TaskListener) -> SyncResult<Subscription> {
        Err(SyncError::Offline)
    }

    fn push_create(&self, _task: &Task) -> SyncResult<TaskId> {
        Err(SyncError::Offline)
    }

    fn push_update(&self, _id: &str, _patch: &TaskPatch, _updated_at: i64) -> SyncResult<()> {
        Err(SyncError::Offline)
    }

    fn push_delete(&self, _id: &str) -> SyncResult<()> {
        Err(SyncError::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalOnly, RemoteBacked, SyncError, SyncStrategy};
    use crate::model::task::{temporary_id, TaskPatch};
    use crate::remote::memory_store::MemoryDocumentStore;
    use std::sync::Arc;

    #[test]
    fn remote_backed_rejects_temporary_ids_without_calling_store() {
        let store = MemoryDocumentStore::new();
        let strategy = RemoteBacked::new(Arc::new(store.clone()));
        let temp = temporary_id(12);

        let err = strategy.push_delete(&temp).unwrap_err();
        assert_eq!(err, SyncError::TemporaryId(temp.clone()));
        let err = strategy
            .push_update(&temp, &TaskPatch::default(), 1)
            .unwrap_err();
        assert_eq!(err.code(), "temporary_id");
        assert!(store.calls().is_empty());
    }

    #[test]
    fn remote_backed_wraps_backend_errors() {
        let store = MemoryDocumentStore::new();
        store.set_fail_writes(true);
        let strategy = RemoteBacked::new(Arc::new(store));
        let err = strategy.push_delete("abc").unwrap_err();
        assert!(err.is_remote_failure());
        assert_eq!(err.code(), "unavailable");
    }

    #[test]
    fn local_only_reports_offline() {
        let err = LocalOnly.push_delete("abc").unwrap_err();
        assert_eq!(err, SyncError::Offline);
        assert!(!err.is_remote_failure());
        assert_eq!(LocalOnly.name(), "local");
    }
}
