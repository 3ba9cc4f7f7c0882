//! Connectivity-aware task data access.
//!
//! # Responsibility
//! - Serve task CRUD for the signed-in user through the backend when it is
//!   reachable and through the local mirror otherwise.
//! - Keep the in-memory collection, the mirror and the statistics in step.
//!
//! # Invariants
//! - Remote failures never fail an operation; the mirror write always runs.
//! - Temporary-id tasks are never sent to the backend.
//! - Statistics are recomputed from scratch on every collection change.
//! - No lock is held while calling a sync strategy, so snapshot listeners
//!   that fire from inside a write can take the state lock.
//! - Callers never learn the remote outcome of a write; missing local ids
//!   are logged and skipped.

use crate::clock::Clock;
use crate::mirror::local_mirror::LocalMirror;
use crate::model::task::{
    temporary_id, Task, TaskDraft, TaskFilter, TaskId, TaskPatch, TaskValidationError,
};
use crate::remote::document_store::{RemoteResult, Subscription, TaskListener};
use crate::service::auth_service::Session;
use crate::stats::task_stats::{compute_stats, TaskStats};
use crate::sync::selector::StrategySelector;
use crate::sync::strategy::SyncError;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskServiceError {
    Validation(TaskValidationError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Where the current collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Nothing loaded yet, or signed out.
    Empty,
    /// Backend snapshots over a live stream; local edits the backend accepted
    /// keep this source.
    Remote,
    /// Local mirror, possibly ahead of or behind the backend.
    Mirror,
}

struct TaskState {
    owner_id: Option<String>,
    /// Bumped by every `list`/`clear`; stale listeners compare against it.
    generation: u64,
    tasks: Vec<Task>,
    stats: TaskStats,
    loading: bool,
    source: DataSource,
    /// Cleared when the stream ends with an error.
    streaming: bool,
}

impl TaskState {
    fn new() -> Self {
        Self {
            owner_id: None,
            generation: 0,
            tasks: Vec::new(),
            stats: TaskStats::default(),
            loading: true,
            source: DataSource::Empty,
            streaming: false,
        }
    }

    fn replace(&mut self, tasks: Vec<Task>, source: DataSource, now_ms: i64) {
        let tasks = match self.owner_id.as_deref() {
            Some(owner_id) => owned_by(tasks, owner_id),
            None => tasks,
        };
        self.stats = compute_stats(&tasks, now_ms);
        self.tasks = tasks;
        self.loading = false;
        self.source = source;
    }
}

fn owned_by(mut tasks: Vec<Task>, owner_id: &str) -> Vec<Task> {
    tasks.retain(|task| task.user_id == owner_id);
    tasks
}

fn lock_state(state: &Mutex<TaskState>) -> MutexGuard<'_, TaskState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Task data-access service for one signed-in user at a time.
pub struct TaskService {
    selector: StrategySelector,
    mirror: LocalMirror,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<TaskState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl TaskService {
    pub fn new(selector: StrategySelector, mirror: LocalMirror, clock: Arc<dyn Clock>) -> Self {
        Self {
            selector,
            mirror,
            clock,
            state: Arc::new(Mutex::new(TaskState::new())),
            subscription: Mutex::new(None),
        }
    }

    /// Loads `user_id`'s tasks.
    ///
    /// Online: subscribes to the backend change stream; every snapshot
    /// replaces the collection and is mirrored. A failed subscribe or a
    /// stream error falls back to one mirror read. Offline: one mirror read.
    /// Nothing resubscribes automatically; call `list` again after
    /// connectivity returns.
    pub fn list(&self, user_id: &str) {
        self.cancel_subscription();
        let generation = {
            let mut state = lock_state(&self.state);
            state.generation += 1;
            state.owner_id = Some(user_id.to_string());
            state.loading = true;
            state.streaming = true;
            state.generation
        };

        let strategy = self.selector.select();
        let listener = self.snapshot_listener(user_id, generation);
        match strategy.subscribe(user_id, listener) {
            Ok(subscription) => {
                info!(
                    "event=tasks_subscribe module=task_service status=ok strategy={}",
                    strategy.name()
                );
                *self.lock_subscription() = Some(subscription);
            }
            Err(err) => {
                log_degraded("tasks_subscribe", user_id, &err);
                let tasks = self.mirror.tasks();
                let now_ms = self.clock.now_ms();
                let mut state = lock_state(&self.state);
                state.streaming = false;
                state.replace(tasks, DataSource::Mirror, now_ms);
            }
        }
    }

    /// Creates a task for the session's user.
    ///
    /// Returns the backend id when the remote write succeeds (the task then
    /// arrives through the subscription). Otherwise the task gets a
    /// temporary id, is prepended to the mirror and shown immediately.
    pub fn create(&self, session: &Session, draft: TaskDraft) -> TaskServiceResult<TaskId> {
        let now_ms = self.clock.now_ms();
        let mut task = draft.into_task(session.uid(), now_ms)?;

        let strategy = self.selector.select();
        match strategy.push_create(&task) {
            Ok(id) => {
                info!("event=task_create module=task_service status=ok id={id}");
                return Ok(id);
            }
            Err(err) => log_degraded("task_create", session.uid(), &err),
        }

        let mut tasks = self.mirror_tasks();
        task.id = unique_temporary_id(&tasks, now_ms);
        let id = task.id.clone();
        tasks.insert(0, task);
        self.mirror.set_tasks(&tasks);
        self.replace_state(tasks, DataSource::Mirror);
        info!("event=task_create module=task_service status=local_only id={id}");
        Ok(id)
    }

    /// Applies `patch` to task `id`.
    ///
    /// The backend is tried unless the id is temporary or the client is
    /// offline; its outcome only gets logged. The mirror is then patched and
    /// becomes the rendered state. An id missing from the mirror skips the
    /// local write.
    pub fn update(&self, id: &str, patch: TaskPatch) -> TaskServiceResult<()> {
        let now_ms = self.clock.now_ms();
        let pushed = match self.selector.select().push_update(id, &patch, now_ms) {
            Ok(()) => true,
            Err(err) => {
                log_degraded("task_update", id, &err);
                false
            }
        };

        let mut tasks = self.mirror_tasks();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            debug!(
                "event=task_update module=task_service status=skipped reason=not_in_mirror id={id}"
            );
            return Ok(());
        };
        patch.apply(task, now_ms);
        self.mirror.set_tasks(&tasks);
        self.replace_after_write(tasks, pushed);
        Ok(())
    }

    /// Deletes task `id` with the same dual write as `update`. Unknown ids
    /// are a no-op.
    pub fn delete(&self, id: &str) -> TaskServiceResult<()> {
        let pushed = match self.selector.select().push_delete(id) {
            Ok(()) => true,
            Err(err) => {
                log_degraded("task_delete", id, &err);
                false
            }
        };

        let mut tasks = self.mirror_tasks();
        tasks.retain(|task| task.id != id);
        self.mirror.set_tasks(&tasks);
        self.replace_after_write(tasks, pushed);
        Ok(())
    }

    /// Sign-out path: stops the stream and empties state and the task slot.
    pub fn clear(&self) {
        self.cancel_subscription();
        {
            let mut state = lock_state(&self.state);
            state.generation += 1;
            state.owner_id = None;
            state.tasks.clear();
            state.stats = TaskStats::default();
            state.loading = false;
            state.source = DataSource::Empty;
            state.streaming = false;
        }
        self.mirror.set_tasks(&[]);
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock_state(&self.state).tasks.clone()
    }

    pub fn stats(&self) -> TaskStats {
        lock_state(&self.state).stats.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock_state(&self.state).loading
    }

    pub fn source(&self) -> DataSource {
        lock_state(&self.state).source
    }

    /// Whether a change stream is still delivering snapshots. Turns false
    /// after a stream error; call `list` again to resubscribe.
    pub fn is_subscribed(&self) -> bool {
        let streaming = lock_state(&self.state).streaming;
        streaming && self.lock_subscription().is_some()
    }

    pub fn filtered(&self, filter: &TaskFilter) -> Vec<Task> {
        lock_state(&self.state)
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    /// Tasks that only exist locally.
    pub fn unsynced_tasks(&self) -> Vec<Task> {
        lock_state(&self.state)
            .tasks
            .iter()
            .filter(|task| task.is_unsynced())
            .cloned()
            .collect()
    }

    fn snapshot_listener(&self, owner_id: &str, generation: u64) -> TaskListener {
        let state = Arc::clone(&self.state);
        let mirror = self.mirror.clone();
        let clock = Arc::clone(&self.clock);
        let owner_id = owner_id.to_string();

        Arc::new(move |delivery: RemoteResult<Vec<Task>>| {
            let mut state = lock_state(&state);
            if state.generation != generation {
                return;
            }
            match delivery {
                Ok(tasks) => {
                    debug!(
                        "event=tasks_snapshot module=task_service status=ok count={}",
                        tasks.len()
                    );
                    mirror.set_tasks(&tasks);
                    state.replace(tasks, DataSource::Remote, clock.now_ms());
                }
                Err(err) => {
                    warn!(
                        "event=tasks_snapshot module=task_service status=fallback owner={} error={}",
                        owner_id, err
                    );
                    state.streaming = false;
                    state.replace(mirror.tasks(), DataSource::Mirror, clock.now_ms());
                }
            }
        })
    }

    /// Mirror contents, or the in-memory collection when the mirror is unreadable.
    fn mirror_tasks(&self) -> Vec<Task> {
        match self.mirror.read_tasks() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!("event=mirror_read module=task_service status=fallback error={err}");
                self.tasks()
            }
        }
    }

    fn replace_state(&self, tasks: Vec<Task>, source: DataSource) {
        let now_ms = self.clock.now_ms();
        lock_state(&self.state).replace(tasks, source, now_ms);
    }

    /// Local write after a dual write. A live stream stays the source when
    /// the backend accepted the same change.
    fn replace_after_write(&self, tasks: Vec<Task>, pushed: bool) {
        let now_ms = self.clock.now_ms();
        let mut state = lock_state(&self.state);
        let source = if pushed && state.streaming && state.source == DataSource::Remote {
            DataSource::Remote
        } else {
            DataSource::Mirror
        };
        state.replace(tasks, source, now_ms);
    }

    fn cancel_subscription(&self) {
        let previous = self.lock_subscription().take();
        if let Some(subscription) = previous {
            subscription.cancel();
            debug!("event=tasks_unsubscribe module=task_service status=ok");
        }
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TaskService {
    fn drop(&mut self) {
        self.cancel_subscription();
    }
}

/// `temp_<ms>`, suffixed when another task already holds that id.
fn unique_temporary_id(tasks: &[Task], now_ms: i64) -> TaskId {
    let base = temporary_id(now_ms);
    let taken = |candidate: &str| tasks.iter().any(|task| task.id == candidate);
    if !taken(&base) {
        return base;
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn log_degraded(event: &str, subject: &str, err: &SyncError) {
    if err.is_remote_failure() {
        warn!("event={event} module=task_service status=fallback subject={subject} error={err}");
    } else {
        debug!(
            "event={event} module=task_service status=local_only subject={subject} reason={}",
            err.code()
        );
    }
}
