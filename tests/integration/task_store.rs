//! Integration tests for the task store.
//!
//! Exercises `TaskStore` end to end against an in-memory backend: adding,
//! toggling, editing and deleting tasks, filtering, corrupt-state recovery,
//! and write-failure reporting.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use tasklist::storage::MemoryStore;
use tasklist::tasks::{
    Outcome, STORAGE_KEY, StoreWarning, TaskPersistence, TaskStore, ValidationError,
};
use tasklist_proto::codec;
use tasklist_proto::{FilterMode, Priority, TaskId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Creates a store over a clone of `backend`, which stays available for inspection.
fn make_store(backend: &MemoryStore) -> TaskStore<MemoryStore> {
    TaskStore::load(TaskPersistence::new(backend.clone()))
}

/// Adds a task and returns its id.
fn add(store: &mut TaskStore<MemoryStore>, text: &str) -> TaskId {
    match store.add_task(text, "", Priority::Medium) {
        Outcome::Added(id) => id,
        other => panic!("expected Added, got {other:?}"),
    }
}

/// Decodes whatever the backend currently holds under the task key.
fn persisted(backend: &MemoryStore) -> Vec<tasklist_proto::Task> {
    let raw = backend.raw(STORAGE_KEY).expect("tasks should be saved");
    codec::decode(&raw).expect("saved tasks should decode")
}

// ===========================================================================
// End-to-end scenarios
// ===========================================================================

#[test]
fn test_add_toggle_and_filter_scenario() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    assert!(store.is_empty());

    let id = match store.add_task("Buy milk", "", Priority::High) {
        Outcome::Added(id) => id,
        other => panic!("expected Added, got {other:?}"),
    };
    assert_eq!(store.len(), 1);
    let task = &store.tasks()[0];
    assert_eq!(task.text, "Buy milk");
    assert_eq!(task.detail, None);
    assert_eq!(task.priority, Priority::High);
    assert!(!task.completed);

    assert_eq!(
        store.toggle_complete(&id),
        Outcome::Toggled { completed: true }
    );
    assert!(store.get(&id).unwrap().completed);

    store.set_filter(FilterMode::Active);
    assert!(store.visible_tasks().is_empty());

    store.set_filter(FilterMode::Completed);
    let visible = store.visible_tasks();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, id);
}

#[test]
fn test_edit_scenario_keeps_completion_and_creation_time() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    let id = match store.add_task("Buy milk", "", Priority::High) {
        Outcome::Added(id) => id,
        other => panic!("expected Added, got {other:?}"),
    };
    store.toggle_complete(&id);
    let before = store.get(&id).unwrap().clone();

    assert_eq!(
        store.edit_task(&id, "Buy oat milk", "2%", Priority::Low),
        Outcome::Updated
    );

    let after = store.get(&id).unwrap();
    assert_eq!(after.text, "Buy oat milk");
    assert_eq!(after.detail.as_deref(), Some("2%"));
    assert_eq!(after.priority, Priority::Low);
    assert_eq!(after.completed, before.completed);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.id, before.id);
}

// ===========================================================================
// Validation and not-found handling
// ===========================================================================

#[test]
fn test_blank_text_is_rejected_without_writing() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);

    for text in ["", "   ", "\t\n"] {
        assert_eq!(
            store.add_task(text, "detail", Priority::Low),
            Outcome::Rejected(ValidationError::TextEmpty)
        );
    }
    assert!(store.is_empty());
    assert_eq!(backend.write_count(), 0, "rejected adds must not write");
}

#[test]
fn test_text_is_stored_as_given() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);

    let id = match store.add_task("  Buy milk  ", "  2%  ", Priority::High) {
        Outcome::Added(id) => id,
        other => panic!("expected Added, got {other:?}"),
    };
    let task = store.get(&id).unwrap();
    assert_eq!(task.text, "  Buy milk  ", "text is validated, not rewritten");
    assert_eq!(task.detail.as_deref(), Some("2%"), "detail is trimmed");

    store.edit_task(&id, "Buy oat milk ", "", Priority::Low);
    assert_eq!(store.get(&id).unwrap().text, "Buy oat milk ");
    assert_eq!(persisted(&backend), store.tasks());
}

#[test]
fn test_blank_edit_is_rejected_and_task_unchanged() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    let id = add(&mut store, "keep me");
    let writes = backend.write_count();

    assert_eq!(
        store.edit_task(&id, "  ", "new detail", Priority::High),
        Outcome::Rejected(ValidationError::TextEmpty)
    );
    let task = store.get(&id).unwrap();
    assert_eq!(task.text, "keep me");
    assert_eq!(task.detail, None);
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(backend.write_count(), writes);
}

#[test]
fn test_unknown_id_is_a_no_op_for_every_mutation() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    add(&mut store, "a");
    add(&mut store, "b");
    let snapshot = store.tasks().to_vec();
    let writes = backend.write_count();

    let ghost = TaskId::from_string("does-not-exist");
    assert_eq!(store.toggle_complete(&ghost), Outcome::NotFound);
    assert_eq!(store.delete_task(&ghost), Outcome::NotFound);
    assert_eq!(
        store.edit_task(&ghost, "x", "", Priority::High),
        Outcome::NotFound
    );

    assert_eq!(store.tasks(), snapshot.as_slice());
    assert_eq!(backend.write_count(), writes);
}

// ===========================================================================
// Ordering and write-through
// ===========================================================================

#[test]
fn test_delete_preserves_relative_order() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    let a = add(&mut store, "a");
    let b = add(&mut store, "b");
    let c = add(&mut store, "c");

    assert_eq!(store.delete_task(&b), Outcome::Deleted);

    let ids: Vec<&TaskId> = store.tasks().iter().map(|t| &t.id).collect();
    assert_eq!(ids, vec![&a, &c]);
}

#[test]
fn test_every_mutation_is_written_through() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);

    let a = add(&mut store, "a");
    assert_eq!(persisted(&backend), store.tasks());

    store.toggle_complete(&a);
    assert_eq!(persisted(&backend), store.tasks());

    store.edit_task(&a, "a2", "note", Priority::High);
    assert_eq!(persisted(&backend), store.tasks());

    store.delete_task(&a);
    assert!(persisted(&backend).is_empty());
}

#[test]
fn test_set_filter_does_not_write() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    add(&mut store, "a");
    let writes = backend.write_count();

    store.set_filter(FilterMode::Completed);
    store.set_filter(FilterMode::All);
    assert_eq!(backend.write_count(), writes);
}

#[test]
fn test_toggle_twice_restores_original() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    let id = add(&mut store, "a");

    store.toggle_complete(&id);
    store.toggle_complete(&id);
    assert!(!store.get(&id).unwrap().completed);
}

// ===========================================================================
// Loading
// ===========================================================================

#[test]
fn test_second_session_sees_first_sessions_tasks() {
    let backend = MemoryStore::new();
    let mut first = make_store(&backend);
    let id = add(&mut first, "persisted");
    first.edit_task(&id, "persisted", "with detail", Priority::Low);

    let second = make_store(&backend);
    assert_eq!(second.tasks(), first.tasks());
    assert_eq!(second.filter(), FilterMode::All);
}

#[test]
fn test_corrupt_state_starts_empty_and_is_kept_aside() {
    let backend = MemoryStore::new();
    backend.seed(STORAGE_KEY, "{not json");

    let mut store = make_store(&backend);
    assert!(store.is_empty());
    assert!(store.take_warnings().is_empty());
    assert_eq!(
        backend.raw("tasks.corrupted").as_deref(),
        Some("{not json")
    );

    // The next mutation overwrites the corrupt value.
    add(&mut store, "fresh");
    assert_eq!(persisted(&backend).len(), 1);
}

#[test]
fn test_legacy_records_get_defaults() {
    let backend = MemoryStore::new();
    backend.seed(
        STORAGE_KEY,
        r#"[{"id":"1700000000000","text":"old","completed":true}]"#,
    );

    let store = make_store(&backend);
    let task = &store.tasks()[0];
    assert_eq!(task.id.as_str(), "1700000000000");
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.detail, None);
    assert!(task.completed);
}

#[test]
fn test_reload_discards_unsaved_state() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    add(&mut store, "saved");

    backend.set_fail_writes(true);
    add(&mut store, "unsaved");
    assert_eq!(store.len(), 2);
    store.set_filter(FilterMode::Completed);

    store.reload();
    assert_eq!(store.len(), 1);
    assert_eq!(store.tasks()[0].text, "saved");
    assert_eq!(store.filter(), FilterMode::All);
    assert!(store.take_warnings().is_empty());
}

// ===========================================================================
// Write failures
// ===========================================================================

#[test]
fn test_write_failure_keeps_memory_authoritative() {
    let backend = MemoryStore::new();
    let mut store = make_store(&backend);
    add(&mut store, "first");

    backend.set_fail_writes(true);
    let id = add(&mut store, "second");
    assert_eq!(store.len(), 2, "in-memory state keeps the change");
    assert!(store.get(&id).is_some());
    assert_eq!(persisted(&backend).len(), 1, "storage keeps the old value");

    let warnings = store.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], StoreWarning::SaveFailed { .. }));
    assert!(store.take_warnings().is_empty(), "warnings are drained");

    // Once storage recovers, the next mutation saves everything.
    backend.set_fail_writes(false);
    store.toggle_complete(&id);
    assert_eq!(persisted(&backend), store.tasks());
}

#[test]
fn test_quota_exceeded_is_reported_as_warning() {
    let backend = MemoryStore::with_quota(64);
    let mut store = make_store(&backend);

    let long = "x".repeat(200);
    assert!(matches!(
        store.add_task(&long, "", Priority::Low),
        Outcome::Added(_)
    ));
    let warnings = store.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0].to_string().contains("quota"),
        "unexpected warning: {}",
        warnings[0]
    );
    assert_eq!(backend.raw(STORAGE_KEY), None);
}
