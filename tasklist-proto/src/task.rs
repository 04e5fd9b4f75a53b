//! Task record types for `Tasklist`.
//!
//! A [`Task`] is a single to-do item. Tasks are identified by an opaque
//! [`TaskId`], carry a short label, an optional longer detail, a completion
//! flag, a creation timestamp and a [`Priority`].

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier for a task.
///
/// Freshly created tasks get a time-ordered UUID v7 string. Identifiers read
/// back from storage are kept verbatim, whatever their shape, so records
/// written by older versions stay addressable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wraps an existing identifier string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Importance of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default for new and legacy tasks.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the lowercase text form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Returns the next priority, wrapping from `High` to `Low`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Returns the previous priority, wrapping from `Low` to `High`.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown priority name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0} (expected low, medium or high)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// A single to-do item.
///
/// `text` is never empty once a task exists. `detail` is either absent or
/// holds non-blank text; see [`normalize_detail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, immutable after creation.
    pub id: TaskId,
    /// Short label.
    pub text: String,
    /// Optional longer note.
    pub detail: Option<String>,
    /// Whether the task is done.
    pub completed: bool,
    /// When the task was created (millisecond precision), immutable.
    pub created_at: DateTime<Utc>,
    /// Importance of the task.
    pub priority: Priority,
}

impl Task {
    /// Creates a new, incomplete task stamped with the current time.
    ///
    /// The caller is responsible for passing already-validated text.
    #[must_use]
    pub fn new(text: String, detail: Option<String>, priority: Priority) -> Self {
        Self {
            id: TaskId::new(),
            text,
            detail,
            completed: false,
            created_at: now(),
            priority,
        }
    }
}

/// Trims a detail note, collapsing blank input to `None`.
#[must_use]
pub fn normalize_detail(detail: &str) -> Option<String> {
    let trimmed = detail.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Returns the current time truncated to millisecond precision.
///
/// Timestamps are stored with millisecond precision, so truncating at
/// creation keeps in-memory and persisted values identical.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
