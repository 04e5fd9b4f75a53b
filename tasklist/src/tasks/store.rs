//! The authoritative in-memory task collection.
//!
//! `TaskStore` owns the ordered task list and the active filter and mediates
//! every change to them. Mutations never fail from the caller's point of
//! view: each returns an [`Outcome`] describing what happened, and storage
//! write failures are logged and queued as [`StoreWarning`]s while the
//! in-memory state stays authoritative for the rest of the session.

use tasklist_proto::{FilterCounts, FilterMode, Priority, Task, TaskId, filter_tasks, task};

use super::ValidationError;
use super::persistence::{PersistenceError, TaskPersistence};
use crate::storage::KeyValueStore;

/// Result of a mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A task was appended; carries its new id.
    Added(TaskId),
    /// A task's completion flag was flipped to `completed`.
    Toggled {
        /// The new value of the flag.
        completed: bool,
    },
    /// A task's text, detail and priority were replaced.
    Updated,
    /// A task was removed.
    Deleted,
    /// The request was invalid; nothing changed.
    Rejected(ValidationError),
    /// No task has the given id; nothing changed.
    NotFound,
}

impl Outcome {
    /// Returns `true` if the collection changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(
            self,
            Self::Added(_) | Self::Toggled { .. } | Self::Updated | Self::Deleted
        )
    }
}

/// Non-fatal problem the presentation layer should tell the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// The latest change is kept in memory but could not be written.
    SaveFailed {
        /// Description of the error.
        reason: String,
    },
}

impl std::fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SaveFailed { reason } => write!(f, "Changes could not be saved: {reason}"),
        }
    }
}

/// Owner of the task collection and the active filter.
///
/// Construct one per session with [`TaskStore::load`] and pass it by
/// reference to whatever renders it.
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    /// Tasks in creation order.
    tasks: Vec<Task>,
    /// Active view filter.
    filter: FilterMode,
    /// Write-through target for every mutation.
    persistence: TaskPersistence<S>,
    /// Warnings not yet collected by the caller.
    warnings: Vec<StoreWarning>,
    /// Stored data could not be read and has not been copied aside yet.
    /// Saves are held back while this is set.
    pending_backup: bool,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Creates a store from whatever `persistence` currently holds.
    ///
    /// Absent state yields an empty collection. Unreadable state is logged,
    /// copied aside, and also yields an empty collection; this never fails.
    /// If the copy cannot be made, later saves are held back (and reported
    /// as warnings) until it can, so the stored data is never overwritten.
    #[must_use]
    pub fn load(persistence: TaskPersistence<S>) -> Self {
        let mut store = Self {
            tasks: Vec::new(),
            filter: FilterMode::All,
            persistence,
            warnings: Vec::new(),
            pending_backup: false,
        };
        store.tasks = store.read_persisted();
        store
    }

    /// Discards in-memory state and reloads it from storage.
    ///
    /// The filter is reset to [`FilterMode::All`] and pending warnings are
    /// dropped.
    pub fn reload(&mut self) {
        self.tasks = self.read_persisted();
        self.filter = FilterMode::All;
        self.warnings.clear();
        tracing::info!(tasks = self.tasks.len(), "task store reloaded");
    }

    fn read_persisted(&mut self) -> Vec<Task> {
        self.pending_backup = false;
        match self.persistence.load() {
            Ok(Some(tasks)) => {
                tracing::info!(tasks = tasks.len(), "loaded saved tasks");
                tasks
            }
            Ok(None) => {
                tracing::info!("no saved tasks, starting empty");
                Vec::new()
            }
            Err(PersistenceError::Deserialization(e)) => {
                tracing::error!(error = %e, "failed to parse saved tasks, starting empty");
                self.back_up_unreadable();
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read saved tasks, starting empty");
                self.back_up_unreadable();
                Vec::new()
            }
        }
    }

    /// Copies unreadable stored data aside. Returns `true` once it is safe
    /// to overwrite the stored collection.
    fn back_up_unreadable(&mut self) -> bool {
        match self.persistence.quarantine() {
            Ok(_) => {
                self.pending_backup = false;
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "could not keep a copy of unreadable tasks, holding back saves"
                );
                self.pending_backup = true;
                false
            }
        }
    }

    /// Appends a new task.
    ///
    /// `text` is stored as given but rejected with
    /// [`ValidationError::TextEmpty`] if it is blank. `detail` is trimmed, and
    /// a blank detail is stored as absent.
    pub fn add_task(&mut self, text: &str, detail: &str, priority: Priority) -> Outcome {
        if text.trim().is_empty() {
            tracing::debug!("rejected task with empty text");
            return Outcome::Rejected(ValidationError::TextEmpty);
        }

        let task = Task::new(text.to_string(), task::normalize_detail(detail), priority);
        let id = task.id.clone();
        self.tasks.push(task);
        tracing::debug!(task_id = %id, %priority, "task added");
        self.persist();
        Outcome::Added(id)
    }

    /// Flips the completion flag of the task with `id`.
    pub fn toggle_complete(&mut self, id: &TaskId) -> Outcome {
        let Some(task) = self.find_mut(id) else {
            tracing::debug!(task_id = %id, "toggle for unknown task ignored");
            return Outcome::NotFound;
        };
        task.completed = !task.completed;
        let completed = task.completed;
        tracing::debug!(task_id = %id, completed, "task toggled");
        self.persist();
        Outcome::Toggled { completed }
    }

    /// Removes the task with `id`, keeping the order of the rest.
    pub fn delete_task(&mut self, id: &TaskId) -> Outcome {
        let Some(index) = self.tasks.iter().position(|t| &t.id == id) else {
            tracing::debug!(task_id = %id, "delete for unknown task ignored");
            return Outcome::NotFound;
        };
        self.tasks.remove(index);
        tracing::debug!(task_id = %id, "task deleted");
        self.persist();
        Outcome::Deleted
    }

    /// Replaces the text, detail and priority of the task with `id`.
    ///
    /// Completion state, id and creation time are untouched. Blank text is
    /// rejected the same way [`add_task`](Self::add_task) rejects it, and the
    /// task is left as it was.
    pub fn edit_task(
        &mut self,
        id: &TaskId,
        new_text: &str,
        new_detail: &str,
        new_priority: Priority,
    ) -> Outcome {
        if new_text.trim().is_empty() {
            tracing::debug!(task_id = %id, "rejected edit with empty text");
            return Outcome::Rejected(ValidationError::TextEmpty);
        }
        let Some(task) = self.find_mut(id) else {
            tracing::debug!(task_id = %id, "edit for unknown task ignored");
            return Outcome::NotFound;
        };
        task.text = new_text.to_string();
        task.detail = task::normalize_detail(new_detail);
        task.priority = new_priority;
        tracing::debug!(task_id = %id, priority = %new_priority, "task updated");
        self.persist();
        Outcome::Updated
    }

    /// Sets the active filter.
    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    /// Returns the active filter.
    #[must_use]
    pub const fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Returns the tasks matching the active filter, in collection order.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&Task> {
        filter_tasks(&self.tasks, self.filter)
    }

    /// Returns every task in creation order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Number of tasks in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if there are no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks under each filter.
    #[must_use]
    pub fn counts(&self) -> FilterCounts {
        FilterCounts::of(&self.tasks)
    }

    /// Returns and clears pending warnings.
    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Returns the persistence adapter.
    #[must_use]
    pub const fn persistence(&self) -> &TaskPersistence<S> {
        &self.persistence
    }

    fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    /// Writes the full collection through to storage.
    fn persist(&mut self) {
        if self.pending_backup && !self.back_up_unreadable() {
            self.warnings.push(StoreWarning::SaveFailed {
                reason: "saved tasks could not be read or copied aside".to_string(),
            });
            return;
        }
        if let Err(err) = self.persistence.save(&self.tasks) {
            tracing::warn!(
                error = %err,
                tasks = self.tasks.len(),
                "task save failed, keeping in-memory state"
            );
            self.warnings.push(StoreWarning::SaveFailed {
                reason: err.to_string(),
            });
        }
    }
}
