//! Property-based tests for `TaskStore` mutations.
//!
//! Uses proptest to verify, against an in-memory backend:
//! 1. Adding non-blank text grows the collection by one with matching fields.
//! 2. Blank text never changes the collection.
//! 3. Mutations with unknown ids never change the collection.
//! 4. Deleting keeps the relative order of the remaining tasks.
//! 5. Whatever sequence of operations runs, a fresh store over the same
//!    backend loads exactly the in-memory collection.

use proptest::prelude::*;
use tasklist::storage::MemoryStore;
use tasklist::tasks::{Outcome, TaskPersistence, TaskStore};
use tasklist_proto::{Priority, TaskId};

fn make_store(backend: &MemoryStore) -> TaskStore<MemoryStore> {
    TaskStore::load(TaskPersistence::new(backend.clone()))
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

/// Whitespace-only strings, including the empty string.
fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n\r]{0,8}"
}

/// One user action; indices pick an existing task modulo the collection size.
#[derive(Debug, Clone)]
enum Op {
    Add(String, String, Priority),
    Toggle(usize),
    Delete(usize),
    Edit(usize, String, String, Priority),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("[a-z ]{0,12}", "[a-z ]{0,12}", arb_priority())
            .prop_map(|(t, d, p)| Op::Add(t, d, p)),
        any::<usize>().prop_map(Op::Toggle),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), "[a-z ]{0,12}", "[a-z ]{0,12}", arb_priority())
            .prop_map(|(i, t, d, p)| Op::Edit(i, t, d, p)),
    ]
}

fn apply(store: &mut TaskStore<MemoryStore>, op: &Op) {
    let pick = |store: &TaskStore<MemoryStore>, i: usize| -> Option<TaskId> {
        let len = store.len();
        (len > 0).then(|| store.tasks()[i % len].id.clone())
    };
    match op {
        Op::Add(text, detail, priority) => {
            store.add_task(text, detail, *priority);
        }
        Op::Toggle(i) => {
            if let Some(id) = pick(store, *i) {
                store.toggle_complete(&id);
            }
        }
        Op::Delete(i) => {
            if let Some(id) = pick(store, *i) {
                store.delete_task(&id);
            }
        }
        Op::Edit(i, text, detail, priority) => {
            if let Some(id) = pick(store, *i) {
                store.edit_task(&id, text, detail, *priority);
            }
        }
    }
}

proptest! {
    #[test]
    fn add_grows_by_one_with_matching_fields(
        text in "[a-zA-Z0-9]{1,20}",
        pad in arb_blank(),
        detail in prop::option::of("[a-z]{1,20}"),
        priority in arb_priority(),
    ) {
        let backend = MemoryStore::new();
        let mut store = make_store(&backend);
        let padded = format!("{pad}{text}{pad}");
        let raw_detail = detail.clone().unwrap_or_else(|| pad.clone());

        let outcome = store.add_task(&padded, &raw_detail, priority);
        prop_assert!(matches!(outcome, Outcome::Added(_)));
        prop_assert_eq!(store.len(), 1);

        let task = &store.tasks()[0];
        prop_assert_eq!(&task.text, &padded);
        prop_assert_eq!(&task.detail, &detail);
        prop_assert_eq!(task.priority, priority);
        prop_assert!(!task.completed);
    }

    #[test]
    fn blank_text_never_adds(text in arb_blank(), priority in arb_priority()) {
        let backend = MemoryStore::new();
        let mut store = make_store(&backend);
        store.add_task("existing", "", Priority::Medium);

        store.add_task(&text, "detail", priority);
        prop_assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_ids_change_nothing(ops in prop::collection::vec(arb_op(), 0..12), ghost in "[g-z]{1,12}") {
        let backend = MemoryStore::new();
        let mut store = make_store(&backend);
        for op in &ops {
            apply(&mut store, op);
        }
        let snapshot = store.tasks().to_vec();

        // Generated ids are UUIDs (hex and dashes), so these never match.
        let ghost = TaskId::from_string(ghost);
        prop_assert_eq!(store.toggle_complete(&ghost), Outcome::NotFound);
        prop_assert_eq!(store.delete_task(&ghost), Outcome::NotFound);
        prop_assert_eq!(store.edit_task(&ghost, "x", "y", Priority::High), Outcome::NotFound);
        prop_assert_eq!(store.tasks(), snapshot.as_slice());
    }

    #[test]
    fn delete_keeps_relative_order(count in 1usize..10, victim in any::<usize>()) {
        let backend = MemoryStore::new();
        let mut store = make_store(&backend);
        for i in 0..count {
            store.add_task(&format!("task {i}"), "", Priority::Medium);
        }
        let before: Vec<TaskId> = store.tasks().iter().map(|t| t.id.clone()).collect();
        let removed = before[victim % count].clone();

        prop_assert_eq!(store.delete_task(&removed), Outcome::Deleted);

        let expected: Vec<TaskId> = before.into_iter().filter(|id| *id != removed).collect();
        let after: Vec<TaskId> = store.tasks().iter().map(|t| t.id.clone()).collect();
        prop_assert_eq!(after, expected);
    }

    #[test]
    fn persisted_state_matches_memory(ops in prop::collection::vec(arb_op(), 0..24)) {
        let backend = MemoryStore::new();
        let mut store = make_store(&backend);
        for op in &ops {
            apply(&mut store, op);
        }

        let reloaded = make_store(&backend);
        prop_assert_eq!(reloaded.tasks(), store.tasks());
    }
}
