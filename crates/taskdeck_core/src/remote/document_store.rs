//! Remote document store contract.
//!
//! # Responsibility
//! - Describe the backend calls the data-access layer relies on.
//! - Carry backend failures as a stable error envelope.
//!
//! # Invariants
//! - Task snapshots are filtered by owner and ordered by `created_at` DESC.
//! - Dropping or cancelling a `Subscription` stops further deliveries.

use crate::model::profile::{Theme, UserProfile};
use crate::model::task::{Task, TaskId, TaskPatch};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Listener invoked with every task snapshot, or once with the stream error.
pub type TaskListener = Arc<dyn Fn(RemoteResult<Vec<Task>>) + Send + Sync>;

/// Backend operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Subscribe,
    AddTask,
    UpdateTask,
    DeleteTask,
    GetProfile,
    SetProfile,
    UpdateTheme,
}

impl RemoteOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::AddTask => "add_task",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
            Self::GetProfile => "get_profile",
            Self::SetProfile => "set_profile",
            Self::UpdateTheme => "update_theme",
        }
    }
}

/// Backend failure envelope (network, permission, missing document ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub op: RemoteOp,
    /// Stable machine-readable code, e.g. `unavailable`, `not-found`.
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl RemoteError {
    pub fn new(
        op: RemoteOp,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            op,
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }

    pub fn unavailable(op: RemoteOp) -> Self {
        Self::new(op, "unavailable", "The backend is currently unavailable.", true)
    }

    pub fn not_found(op: RemoteOp, id: &str) -> Self {
        Self::new(op, "not-found", format!("No document to update: {id}"), false)
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed [{}]: {}", self.op.as_str(), self.code, self.message)
    }
}

impl Error for RemoteError {}

/// Handle for an active change-stream subscription.
///
/// Cancelling is the only way to stop a stream; dropping the handle cancels.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Backend document store with a `tasks` and a `users` table.
pub trait DocumentStore: Send + Sync {
    /// Subscribes to the owner's tasks, newest first.
    fn subscribe_tasks(&self, owner_id: &str, listener: TaskListener)
        -> RemoteResult<Subscription>;
    /// Stores a new task and returns the store-assigned id.
    fn add_task(&self, task: &Task) -> RemoteResult<TaskId>;
    fn update_task(&self, id: &str, patch: &TaskPatch, updated_at: i64) -> RemoteResult<()>;
    fn delete_task(&self, id: &str) -> RemoteResult<()>;
    fn get_profile(&self, uid: &str) -> RemoteResult<Option<UserProfile>>;
    fn set_profile(&self, profile: &UserProfile) -> RemoteResult<()>;
    fn update_theme(&self, uid: &str, theme: Theme) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::{RemoteError, RemoteOp, Subscription};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscription_cancels_once_on_cancel_or_drop() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cancelled);
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.cancel();
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&cancelled);
        drop(Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn error_display_names_operation_and_code() {
        let err = RemoteError::unavailable(RemoteOp::AddTask);
        assert!(err.retryable);
        assert!(err.to_string().starts_with("add_task failed [unavailable]"));
    }
}
