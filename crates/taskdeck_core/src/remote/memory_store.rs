//! In-process `DocumentStore`.
//!
//! Behaves like the hosted backend for the calls this crate makes: assigns
//! ids, emits an initial snapshot on subscribe and re-emits the owner's
//! snapshot after every write. Failure switches and a call log let callers
//! observe degraded paths.

use crate::model::profile::{Theme, UserProfile};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::remote::document_store::{
    DocumentStore, RemoteError, RemoteOp, RemoteResult, Subscription, TaskListener,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use uuid::Uuid;

/// One attempted backend call, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Subscribe { owner_id: String },
    AddTask { title: String },
    UpdateTask { id: String },
    DeleteTask { id: String },
    GetProfile { uid: String },
    SetProfile { uid: String },
    UpdateTheme { uid: String, theme: Theme },
}

#[derive(Default)]
struct StoreState {
    tasks: BTreeMap<TaskId, Task>,
    profiles: BTreeMap<String, UserProfile>,
    listeners: BTreeMap<u64, (String, TaskListener)>,
    next_listener_id: u64,
    fail_writes: bool,
    fail_subscribe: bool,
    fail_profile_reads: bool,
    calls: Vec<RemoteCall>,
}

impl StoreState {
    fn snapshot(&self, owner_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| task.user_id == owner_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    fn listeners_for(&self, owner_id: &str) -> Vec<TaskListener> {
        self.listeners
            .values()
            .filter(|(owner, _)| owner == owner_id)
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Process-local backend double.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail with `unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Makes `subscribe_tasks` fail with `unavailable`.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.lock().fail_subscribe = fail;
    }

    pub fn set_fail_profile_reads(&self, fail: bool) {
        self.lock().fail_profile_reads = fail;
    }

    /// Terminates every open stream with an error, as a dropped connection does.
    pub fn break_streams(&self) {
        let listeners: Vec<TaskListener> = {
            let mut state = self.lock();
            let listeners = std::mem::take(&mut state.listeners);
            listeners.into_values().map(|(_, listener)| listener).collect()
        };
        for listener in listeners {
            listener(Err(RemoteError::unavailable(RemoteOp::Subscribe)));
        }
    }

    /// Inserts a task directly, as another device would, and notifies its owner.
    pub fn seed_task(&self, task: Task) {
        let owner_id = task.user_id.clone();
        self.lock().tasks.insert(task.id.clone(), task);
        self.notify(&owner_id);
    }

    pub fn seed_profile(&self, profile: UserProfile) {
        self.lock().profiles.insert(profile.uid.clone(), profile);
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.lock().tasks.get(id).cloned()
    }

    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn profile(&self, uid: &str) -> Option<UserProfile> {
        self.lock().profiles.get(uid).cloned()
    }

    pub fn active_listeners(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `call` and fails the write when writes are switched off.
    fn begin_write(
        &self,
        op: RemoteOp,
        call: RemoteCall,
    ) -> RemoteResult<MutexGuard<'_, StoreState>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.fail_writes {
            return Err(RemoteError::unavailable(op));
        }
        Ok(state)
    }

    // Listeners run without the store lock held so they may call back in.
    fn notify(&self, owner_id: &str) {
        let (listeners, snapshot) = {
            let state = self.lock();
            (state.listeners_for(owner_id), state.snapshot(owner_id))
        };
        for listener in listeners {
            listener(Ok(snapshot.clone()));
        }
    }
}

fn remove_listener(state: &Weak<Mutex<StoreState>>, listener_id: u64) {
    if let Some(state) = state.upgrade() {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        state.listeners.remove(&listener_id);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn subscribe_tasks(
        &self,
        owner_id: &str,
        listener: TaskListener,
    ) -> RemoteResult<Subscription> {
        let (listener_id, snapshot) = {
            let mut state = self.lock();
            state.calls.push(RemoteCall::Subscribe {
                owner_id: owner_id.to_string(),
            });
            if state.fail_subscribe {
                return Err(RemoteError::unavailable(RemoteOp::Subscribe));
            }
            let listener_id = state.next_listener_id;
            state.next_listener_id += 1;
            state
                .listeners
                .insert(listener_id, (owner_id.to_string(), Arc::clone(&listener)));
            (listener_id, state.snapshot(owner_id))
        };

        listener(Ok(snapshot));

        let weak_state = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            remove_listener(&weak_state, listener_id)
        }))
    }

    fn add_task(&self, task: &Task) -> RemoteResult<TaskId> {
        let id = Uuid::new_v4().simple().to_string();
        {
            let mut state = self.begin_write(
                RemoteOp::AddTask,
                RemoteCall::AddTask {
                    title: task.title.clone(),
                },
            )?;
            let mut stored = task.clone();
            stored.id = id.clone();
            state.tasks.insert(id.clone(), stored);
        }
        self.notify(&task.user_id);
        Ok(id)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch, updated_at: i64) -> RemoteResult<()> {
        let owner_id = {
            let mut state = self.begin_write(
                RemoteOp::UpdateTask,
                RemoteCall::UpdateTask { id: id.to_string() },
            )?;
            let task = state
                .tasks
                .get_mut(id)
                .ok_or_else(|| RemoteError::not_found(RemoteOp::UpdateTask, id))?;
            patch.apply(task, updated_at);
            task.user_id.clone()
        };
        self.notify(&owner_id);
        Ok(())
    }

    fn delete_task(&self, id: &str) -> RemoteResult<()> {
        let owner_id = {
            let mut state = self.begin_write(
                RemoteOp::DeleteTask,
                RemoteCall::DeleteTask { id: id.to_string() },
            )?;
            state.tasks.remove(id).map(|task| task.user_id)
        };
        // Deleting a missing document succeeds silently.
        if let Some(owner_id) = owner_id {
            self.notify(&owner_id);
        }
        Ok(())
    }

    fn get_profile(&self, uid: &str) -> RemoteResult<Option<UserProfile>> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::GetProfile {
            uid: uid.to_string(),
        });
        if state.fail_profile_reads {
            return Err(RemoteError::unavailable(RemoteOp::GetProfile));
        }
        Ok(state.profiles.get(uid).cloned())
    }

    fn set_profile(&self, profile: &UserProfile) -> RemoteResult<()> {
        let mut state = self.begin_write(
            RemoteOp::SetProfile,
            RemoteCall::SetProfile {
                uid: profile.uid.clone(),
            },
        )?;
        state.profiles.insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    fn update_theme(&self, uid: &str, theme: Theme) -> RemoteResult<()> {
        let mut state = self.begin_write(
            RemoteOp::UpdateTheme,
            RemoteCall::UpdateTheme {
                uid: uid.to_string(),
                theme,
            },
        )?;
        let profile = state
            .profiles
            .get_mut(uid)
            .ok_or_else(|| RemoteError::not_found(RemoteOp::UpdateTheme, uid))?;
        profile.theme = theme;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryDocumentStore, RemoteCall};
    use crate::model::task::{Task, TaskDraft, TaskPatch, TaskStatus};
    use crate::remote::document_store::{DocumentStore, TaskListener};
    use std::sync::{Arc, Mutex};

    fn draft_task(owner: &str, title: &str, created_at: i64) -> Task {
        TaskDraft::new(title).into_task(owner, created_at).unwrap()
    }

    fn recording_listener() -> (TaskListener, Arc<Mutex<Vec<Vec<Task>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: TaskListener = Arc::new(move |snapshot| {
            if let Ok(tasks) = snapshot {
                sink.lock().unwrap().push(tasks);
            }
        });
        (listener, seen)
    }

    #[test]
    fn subscribe_emits_owner_snapshot_newest_first() {
        let store = MemoryDocumentStore::new();
        store.add_task(&draft_task("u1", "older", 1)).unwrap();
        store.add_task(&draft_task("u2", "foreign", 2)).unwrap();
        store.add_task(&draft_task("u1", "newer", 3)).unwrap();

        let (listener, seen) = recording_listener();
        let _subscription = store.subscribe_tasks("u1", listener).unwrap();

        let seen = seen.lock().unwrap();
        let titles: Vec<_> = seen[0].iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[test]
    fn writes_notify_until_subscription_is_cancelled() {
        let store = MemoryDocumentStore::new();
        let (listener, seen) = recording_listener();
        let subscription = store.subscribe_tasks("u1", listener).unwrap();

        let id = store.add_task(&draft_task("u1", "a", 1)).unwrap();
        store
            .update_task(&id, &TaskPatch::status(TaskStatus::Completed), 9)
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(store.task(&id).unwrap().updated_at, 9);

        subscription.cancel();
        assert_eq!(store.active_listeners(), 0);
        store.delete_task(&id).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn failed_writes_are_recorded_and_change_nothing() {
        let store = MemoryDocumentStore::new();
        store.set_fail_writes(true);
        let err = store.add_task(&draft_task("u1", "a", 1)).unwrap_err();
        assert_eq!(err.code, "unavailable");
        assert_eq!(store.task_count(), 0);
        assert_eq!(
            store.calls(),
            vec![RemoteCall::AddTask {
                title: "a".to_string()
            }]
        );
    }

    #[test]
    fn update_of_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update_task("nope", &TaskPatch::default(), 1)
            .unwrap_err();
        assert_eq!(err.code, "not-found");
    }
}
