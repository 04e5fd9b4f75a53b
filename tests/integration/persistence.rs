//! Integration tests for on-disk persistence.
//!
//! Runs `TaskPersistence` and `TaskStore` over a `FileStore` in a temporary
//! directory: save/load round trips, the stored JSON layout, sessions that
//! reopen the same directory, corrupt files and the byte quota.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;

use tasklist::storage::{FileStore, KeyValueStore};
use tasklist::tasks::{Outcome, PersistenceError, STORAGE_KEY, TaskPersistence, TaskStore};
use tasklist_proto::{Priority, Task};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn open_store(dir: &std::path::Path) -> TaskStore<FileStore> {
    TaskStore::load(TaskPersistence::new(FileStore::new(dir)))
}

fn sample_tasks() -> Vec<Task> {
    let mut done = Task::new("Ship it".to_string(), None, Priority::High);
    done.completed = true;
    vec![
        Task::new(
            "Buy milk".to_string(),
            Some("2%".to_string()),
            Priority::Low,
        ),
        done,
        Task::new("Call mum".to_string(), None, Priority::Medium),
    ]
}

// ===========================================================================
// Persistence adapter over the file system
// ===========================================================================

#[test]
fn test_load_before_any_save_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = TaskPersistence::new(FileStore::new(dir.path().join("data")));
    assert!(persistence.load().unwrap().is_none());
}

#[test]
fn test_save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut persistence = TaskPersistence::new(FileStore::new(dir.path()));
    let tasks = sample_tasks();

    persistence.save(&tasks).unwrap();
    let loaded = persistence.load().unwrap().expect("tasks were saved");
    assert_eq!(loaded, tasks);
}

#[test]
fn test_save_overwrites_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut persistence = TaskPersistence::new(FileStore::new(dir.path()));

    persistence.save(&sample_tasks()).unwrap();
    persistence.save(&[]).unwrap();
    assert_eq!(persistence.load().unwrap(), Some(Vec::new()));
}

#[test]
fn test_stored_layout_is_a_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let mut persistence = TaskPersistence::new(FileStore::new(dir.path()));
    persistence.save(&sample_tasks()).unwrap();

    let raw = fs::read_to_string(dir.path().join(STORAGE_KEY)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let records = value.as_array().expect("top level is an array");
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first["text"], "Buy milk");
    assert_eq!(first["detail"], "2%");
    assert_eq!(first["completed"], false);
    assert_eq!(first["priority"], "low");
    assert!(first["id"].is_string());
    assert!(
        first["createdAt"].as_str().unwrap().ends_with('Z'),
        "createdAt should be an RFC 3339 UTC string"
    );

    // Absent detail is omitted rather than written as null or "".
    assert!(records[1].get("detail").is_none());
    assert_eq!(records[1]["completed"], true);
}

#[test]
fn test_invalid_file_is_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(STORAGE_KEY), r#"{"tasks": []}"#).unwrap();

    let persistence = TaskPersistence::new(FileStore::new(dir.path()));
    assert!(matches!(
        persistence.load(),
        Err(PersistenceError::Deserialization(_))
    ));
}

// ===========================================================================
// Store sessions over the same directory
// ===========================================================================

#[test]
fn test_tasks_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();

    let id = {
        let mut store = open_store(dir.path());
        let Outcome::Added(id) = store.add_task("Water plants", "  ", Priority::High) else {
            panic!("add should succeed");
        };
        store.toggle_complete(&id);
        id
    };

    let store = open_store(dir.path());
    let task = store.get(&id).expect("task should be reloaded");
    assert_eq!(task.text, "Water plants");
    assert_eq!(task.detail, None);
    assert_eq!(task.priority, Priority::High);
    assert!(task.completed);
}

#[test]
fn test_corrupt_file_recovers_and_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(STORAGE_KEY), "garbage").unwrap();

    let mut store = open_store(dir.path());
    assert!(store.is_empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("tasks.corrupted")).unwrap(),
        "garbage"
    );

    store.add_task("new start", "", Priority::Medium);
    let reopened = open_store(dir.path());
    assert_eq!(reopened.len(), 1);
}

#[test]
fn test_non_utf8_file_is_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(STORAGE_KEY), b"[\xE9]").unwrap();

    let persistence = TaskPersistence::new(FileStore::new(dir.path()));
    assert!(matches!(
        persistence.load(),
        Err(PersistenceError::Deserialization(_))
    ));
}

#[test]
fn test_non_utf8_file_is_backed_up_before_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let original: &[u8] =
        b"[{\"id\":\"1\",\"text\":\"Caf\xE9 order\",\"completed\":false}]";
    fs::write(dir.path().join(STORAGE_KEY), original).unwrap();

    let mut store = open_store(dir.path());
    assert!(store.is_empty());
    assert_eq!(
        fs::read(dir.path().join("tasks.corrupted")).unwrap(),
        original,
        "the unreadable file is copied aside byte for byte"
    );

    store.add_task("new", "", Priority::Medium);
    assert!(store.take_warnings().is_empty());
    assert_eq!(fs::read(dir.path().join("tasks.corrupted")).unwrap(), original);
    assert_eq!(open_store(dir.path()).len(), 1);
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(dir.path());
    for i in 0..5 {
        store.add_task(&format!("task {i}"), "", Priority::Low);
    }

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![STORAGE_KEY.to_string()]);
}

// ===========================================================================
// Quota
// ===========================================================================

#[test]
fn test_quota_rejects_write_and_keeps_old_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FileStore::new(dir.path()).with_quota(Some(100));
    backend.set(STORAGE_KEY, "[]").unwrap();

    let mut store = TaskStore::load(TaskPersistence::new(backend));
    store.add_task(&"x".repeat(500), "", Priority::Low);

    assert_eq!(store.len(), 1);
    assert_eq!(store.take_warnings().len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join(STORAGE_KEY)).unwrap(),
        "[]"
    );
}
