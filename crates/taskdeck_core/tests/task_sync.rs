use std::sync::Arc;
use taskdeck_core::{
    is_temporary_id, AuthUser, ConnectivityFlag, DataSource, FixedClock, LocalMirror,
    MemoryDocumentStore, Priority, RemoteCall, Session, StrategySelector, Task, TaskCategory,
    TaskDraft, TaskFilter, TaskPatch, TaskService, TaskServiceError, TaskStatus,
    TaskValidationError,
};

const NOW: i64 = 1_700_000_000_000;

struct Harness {
    store: MemoryDocumentStore,
    connectivity: Arc<ConnectivityFlag>,
    clock: Arc<FixedClock>,
    mirror: LocalMirror,
    service: TaskService,
    session: Session,
}

impl Harness {
    fn new(online: bool) -> Self {
        let store = MemoryDocumentStore::new();
        let connectivity = Arc::new(ConnectivityFlag::new(online));
        let clock = Arc::new(FixedClock::new(NOW));
        let mirror = LocalMirror::in_memory();
        let selector = StrategySelector::new(Arc::new(store.clone()), connectivity.clone());
        let service = TaskService::new(selector, mirror.clone(), clock.clone());
        let session = Session::new(
            AuthUser {
                uid: "u1".to_string(),
                email: Some("ada@example.com".to_string()),
                display_name: Some("Ada".to_string()),
            },
            None,
        );
        Self {
            store,
            connectivity,
            clock,
            mirror,
            service,
            session,
        }
    }

    fn create(&self, title: &str) -> String {
        self.service
            .create(&self.session, TaskDraft::new(title))
            .unwrap()
    }

    fn remote_calls_matching(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.store.calls().iter().filter(|call| predicate(call)).count()
    }
}

fn stored_task(id: &str, owner: &str, title: &str, created_at: i64) -> Task {
    let mut task = TaskDraft::new(title).into_task(owner, created_at).unwrap();
    task.id = id.to_string();
    task
}

#[test]
fn service_reports_loading_until_first_list() {
    let harness = Harness::new(true);
    assert!(harness.service.is_loading());
    assert_eq!(harness.service.source(), DataSource::Empty);

    harness.service.list("u1");
    assert!(!harness.service.is_loading());
    assert_eq!(harness.service.source(), DataSource::Remote);
    assert!(harness.service.is_subscribed());
}

#[test]
fn online_create_returns_backend_id_and_arrives_through_subscription() {
    let harness = Harness::new(true);
    harness.service.list("u1");

    let id = harness.create("Write report");

    assert!(!is_temporary_id(&id));
    assert!(harness.store.task(&id).is_some());
    let tasks = harness.service.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(harness.service.source(), DataSource::Remote);
    assert_eq!(harness.mirror.tasks(), tasks);
    assert_eq!(harness.service.stats().total, 1);
}

#[test]
fn snapshots_only_carry_the_listed_users_tasks() {
    let harness = Harness::new(true);
    harness.store.seed_task(stored_task("a", "u1", "mine", NOW - 10));
    harness.store.seed_task(stored_task("b", "u2", "theirs", NOW - 5));

    harness.service.list("u1");
    let ids: Vec<_> = harness.service.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["a".to_string()]);

    harness.service.list("u2");
    let ids: Vec<_> = harness.service.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["b".to_string()]);
    assert_eq!(harness.store.active_listeners(), 1);
}

#[test]
fn offline_create_uses_temporary_id_at_head_of_mirror() {
    let harness = Harness::new(false);
    harness
        .mirror
        .set_tasks(&[stored_task("r1", "u1", "older", NOW - 1_000)]);
    harness.service.list("u1");
    assert_eq!(harness.service.source(), DataSource::Mirror);
    assert_eq!(harness.service.tasks().len(), 1);

    let id = harness.create("Offline task");

    assert_eq!(id, format!("temp_{NOW}"));
    let tasks = harness.service.tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, id);
    assert_eq!(harness.mirror.tasks()[0].id, id);
    assert_eq!(harness.service.unsynced_tasks().len(), 1);
    assert_eq!(harness.service.stats().total, 2);
    assert!(harness.store.calls().is_empty());
}

#[test]
fn offline_creates_in_the_same_millisecond_get_distinct_ids() {
    let harness = Harness::new(false);
    harness.service.list("u1");

    let first = harness.create("one");
    let second = harness.create("two");

    assert_ne!(first, second);
    assert_eq!(second, format!("temp_{NOW}_1"));
    assert_eq!(harness.service.tasks()[0].id, second);
}

#[test]
fn remote_write_failure_falls_back_to_temporary_id() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    harness.store.set_fail_writes(true);

    let id = harness.create("Flaky network");

    assert!(is_temporary_id(&id));
    assert_eq!(
        harness.remote_calls_matching(|call| matches!(call, RemoteCall::AddTask { .. })),
        1
    );
    assert_eq!(harness.store.task_count(), 0);
    assert_eq!(harness.service.tasks()[0].id, id);
    assert_eq!(harness.service.source(), DataSource::Mirror);
}

#[test]
fn temporary_id_update_and_delete_never_reach_the_backend() {
    let harness = Harness::new(false);
    harness.service.list("u1");
    let id = harness.create("Local only");

    harness.connectivity.set_online(true);
    harness.store.clear_calls();

    harness
        .service
        .update(&id, TaskPatch::status(TaskStatus::Completed))
        .unwrap();
    assert_eq!(harness.mirror.tasks()[0].status, TaskStatus::Completed);
    assert_eq!(harness.service.stats().completed, 1);

    harness.service.delete(&id).unwrap();
    assert!(harness.service.tasks().is_empty());
    assert!(harness.mirror.tasks().is_empty());
    assert!(harness.store.calls().is_empty());
}

#[test]
fn online_update_reaches_backend_and_mirror() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    let id = harness.create("Escalate me");
    harness.clock.advance(60_000);

    harness
        .service
        .update(&id, TaskPatch::priority(Priority::Urgent))
        .unwrap();

    let remote = harness.store.task(&id).unwrap();
    assert_eq!(remote.priority, Priority::Urgent);
    assert_eq!(remote.updated_at, NOW + 60_000);
    let local = harness.service.tasks();
    assert_eq!(local[0].priority, Priority::Urgent);
    assert_eq!(harness.mirror.tasks()[0].priority, Priority::Urgent);
    assert_eq!(harness.service.stats().priority_count(Priority::Urgent), 1);
    assert_eq!(harness.service.source(), DataSource::Remote);
}

#[test]
fn remote_update_failure_still_patches_the_mirror() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    let id = harness.create("Keep going");
    harness.store.set_fail_writes(true);

    harness
        .service
        .update(&id, TaskPatch::status(TaskStatus::InProgress))
        .unwrap();

    assert_eq!(harness.store.task(&id).unwrap().status, TaskStatus::Todo);
    assert_eq!(harness.service.tasks()[0].status, TaskStatus::InProgress);
    assert_eq!(harness.service.stats().in_progress, 1);
    assert_eq!(harness.service.source(), DataSource::Mirror);
}

#[test]
fn update_accepted_remotely_succeeds_when_mirror_lacks_the_task() {
    let harness = Harness::new(true);
    harness
        .store
        .seed_task(stored_task("remote-only", "u1", "Not mirrored", NOW - 1));

    harness
        .service
        .update("remote-only", TaskPatch::status(TaskStatus::Completed))
        .unwrap();

    assert_eq!(
        harness.store.task("remote-only").unwrap().status,
        TaskStatus::Completed
    );
    assert!(harness.mirror.tasks().is_empty());
    assert!(harness.service.tasks().is_empty());
}

#[test]
fn update_of_unknown_task_is_a_no_op_offline() {
    let harness = Harness::new(false);
    harness.service.list("u1");
    harness.create("stays");

    harness
        .service
        .update("missing", TaskPatch::status(TaskStatus::Completed))
        .unwrap();

    assert_eq!(harness.service.tasks().len(), 1);
    assert_eq!(harness.service.stats().completed, 0);
}

#[test]
fn delete_of_unknown_task_is_a_no_op() {
    let harness = Harness::new(false);
    harness.service.list("u1");
    harness.create("stays");

    harness.service.delete("missing").unwrap();
    assert_eq!(harness.service.tasks().len(), 1);
}

#[test]
fn online_delete_removes_backend_document() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    let id = harness.create("Short lived");

    harness.service.delete(&id).unwrap();

    assert!(harness.store.task(&id).is_none());
    assert!(harness.service.tasks().is_empty());
    assert!(harness.mirror.tasks().is_empty());
    assert_eq!(harness.service.source(), DataSource::Remote);
}

#[test]
fn stream_error_falls_back_to_mirror_once_without_resubscribing() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    harness.create("Cached before outage");

    assert!(harness.service.is_subscribed());
    harness.store.break_streams();

    assert!(!harness.service.is_subscribed());
    assert_eq!(harness.service.source(), DataSource::Mirror);
    assert_eq!(harness.service.tasks().len(), 1);
    assert_eq!(harness.store.active_listeners(), 0);
    assert_eq!(
        harness.remote_calls_matching(|call| matches!(call, RemoteCall::Subscribe { .. })),
        1
    );
}

#[test]
fn listing_again_after_stream_error_resubscribes() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    harness.store.break_streams();

    harness.service.list("u1");

    assert!(harness.service.is_subscribed());
    assert_eq!(harness.service.source(), DataSource::Remote);
    assert_eq!(harness.store.active_listeners(), 1);
}

#[test]
fn failed_subscribe_reads_the_mirror() {
    let harness = Harness::new(true);
    harness
        .mirror
        .set_tasks(&[stored_task("r1", "u1", "cached", NOW - 1)]);
    harness.store.set_fail_subscribe(true);

    harness.service.list("u1");

    assert!(!harness.service.is_subscribed());
    assert!(!harness.service.is_loading());
    assert_eq!(harness.service.source(), DataSource::Mirror);
    assert_eq!(harness.service.tasks()[0].id, "r1");
}

#[test]
fn other_users_mirrored_tasks_are_hidden() {
    let harness = Harness::new(false);
    harness.mirror.set_tasks(&[
        stored_task("a", "u1", "mine", NOW - 2),
        stored_task("b", "u2", "theirs", NOW - 1),
    ]);

    harness.service.list("u1");

    let ids: Vec<_> = harness.service.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["a".to_string()]);
}

#[test]
fn blank_title_is_rejected_before_any_write() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    harness.store.clear_calls();

    let err = harness
        .service
        .create(&harness.session, TaskDraft::new("   "))
        .unwrap_err();

    assert_eq!(err, TaskServiceError::Validation(TaskValidationError::EmptyTitle));
    assert!(harness.store.calls().is_empty());
    assert!(harness.service.tasks().is_empty());
}

#[test]
fn stats_follow_the_clock_for_overdue_tasks() {
    let harness = Harness::new(false);
    harness.service.list("u1");
    let mut draft = TaskDraft::new("Due soon");
    draft.due_at = Some(NOW + 1_000);
    harness.service.create(&harness.session, draft).unwrap();
    assert_eq!(harness.service.stats().overdue, 0);

    harness.clock.advance(5_000);
    harness.create("Trigger recompute");
    assert_eq!(harness.service.stats().overdue, 1);
}

#[test]
fn filtered_applies_search_and_category() {
    let harness = Harness::new(false);
    harness.service.list("u1");
    let mut draft = TaskDraft::new("Read Rust book");
    draft.category = TaskCategory::Learning;
    harness.service.create(&harness.session, draft).unwrap();
    harness.create("Fix login bug");

    let filter = TaskFilter {
        search: "RUST".to_string(),
        category: None,
    };
    assert_eq!(harness.service.filtered(&filter).len(), 1);

    let filter = TaskFilter {
        search: String::new(),
        category: Some(TaskCategory::Learning),
    };
    let hits = harness.service.filtered(&filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Read Rust book");
}

#[test]
fn clear_stops_the_stream_and_empties_state() {
    let harness = Harness::new(true);
    harness.service.list("u1");
    harness.create("Before sign-out");

    harness.service.clear();

    assert!(harness.service.tasks().is_empty());
    assert_eq!(harness.service.stats().total, 0);
    assert_eq!(harness.service.source(), DataSource::Empty);
    assert!(!harness.service.is_subscribed());
    assert!(harness.mirror.tasks().is_empty());
    assert_eq!(harness.store.active_listeners(), 0);

    // Writes after clear must not resurrect the old stream's state.
    harness.store.seed_task(stored_task("late", "u1", "late", NOW));
    assert!(harness.service.tasks().is_empty());
}
