//! Filtering of a task collection by completion state.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Which tasks a view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every task.
    #[default]
    All,
    /// Tasks not yet completed ("In Progress").
    Active,
    /// Completed tasks.
    Completed,
}

impl FilterMode {
    /// All modes in tab order.
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Returns `true` if `task` belongs in this view.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    /// Human-readable tab label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Active => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Lowercase text form (`all`, `active`, `completed`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Next tab, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }

    /// Previous tab, wrapping around.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::All => Self::Completed,
            Self::Active => Self::All,
            Self::Completed => Self::Active,
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter: {0} (expected all, active or completed)")]
pub struct ParseFilterError(pub String);

impl FromStr for FilterMode {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "in-progress" | "in_progress" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(ParseFilterError(s.to_string())),
        }
    }
}

/// Returns the tasks visible under `mode`, in collection order.
#[must_use]
pub fn filter_tasks(tasks: &[Task], mode: FilterMode) -> Vec<&Task> {
    tasks.iter().filter(|t| mode.matches(t)).collect()
}

/// Number of tasks visible under each filter mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    /// Total number of tasks.
    pub all: usize,
    /// Incomplete tasks.
    pub active: usize,
    /// Completed tasks.
    pub completed: usize,
}

impl FilterCounts {
    /// Counts the tasks in `tasks`.
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            all: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }

    /// Count for one mode.
    #[must_use]
    pub const fn get(&self, mode: FilterMode) -> usize {
        match mode {
            FilterMode::All => self.all,
            FilterMode::Active => self.active,
            FilterMode::Completed => self.completed,
        }
    }
}
