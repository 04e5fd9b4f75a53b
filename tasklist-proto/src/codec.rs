//! Text encoding of a task collection for local storage.
//!
//! The persisted form is a JSON array of objects:
//!
//! ```json
//! [{"id":"…","text":"Buy milk","detail":"2%","completed":false,
//!   "createdAt":"2025-03-01T09:30:00.000Z","priority":"high"}]
//! ```
//!
//! There is no version field. Decoding is lenient about fields added over
//! time: a missing or unknown `priority` becomes `medium`, a missing or
//! unparseable `createdAt` becomes the current time, a missing `completed`
//! becomes `false`, and a blank `detail` becomes absent. Anything that makes
//! the collection unusable (not an array, a record without `id` or `text`,
//! blank text, duplicate ids) is a [`CodecError::Schema`].

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{self, Priority, Task, TaskId};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON, or the collection could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The text is valid JSON but does not describe a task collection.
    #[error("schema error: {0}")]
    Schema(String),
}

/// Borrowed view of a task in its persisted shape.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredTaskRef<'a> {
    id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    completed: bool,
    created_at: String,
    priority: Priority,
}

/// A persisted record as found in storage, before defaults are applied.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: Option<String>,
    text: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    priority: Option<Value>,
}

/// Formats a timestamp the way it is persisted (RFC 3339, UTC, milliseconds).
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Encodes a task collection into its persisted text form.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the collection cannot be serialized.
pub fn encode(tasks: &[Task]) -> Result<String, CodecError> {
    let records: Vec<StoredTaskRef<'_>> = tasks
        .iter()
        .map(|t| StoredTaskRef {
            id: t.id.as_str(),
            text: &t.text,
            detail: t.detail.as_deref(),
            completed: t.completed,
            created_at: format_timestamp(&t.created_at),
            priority: t.priority,
        })
        .collect();
    serde_json::to_string(&records).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a persisted task collection, defaulting missing fields.
///
/// Records without a usable `createdAt` are stamped with the current time.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not JSON, or
/// `CodecError::Schema` if it is not a valid task collection.
pub fn decode(text: &str) -> Result<Vec<Task>, CodecError> {
    decode_at(text, task::now())
}

/// Decodes a persisted task collection, using `now` for missing timestamps.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_at(text: &str, now: DateTime<Utc>) -> Result<Vec<Task>, CodecError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let Value::Array(items) = document else {
        return Err(CodecError::Schema(format!(
            "expected an array of tasks, found {}",
            value_kind(&document)
        )));
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let stored: StoredTask = serde_json::from_value(item)
            .map_err(|e| CodecError::Schema(format!("record {index}: {e}")))?;
        let task = into_task(stored, index, now)?;
        if !seen.insert(task.id.clone()) {
            return Err(CodecError::Schema(format!(
                "record {index}: duplicate id {}",
                task.id
            )));
        }
        tasks.push(task);
    }
    Ok(tasks)
}

fn into_task(stored: StoredTask, index: usize, now: DateTime<Utc>) -> Result<Task, CodecError> {
    let id = stored
        .id
        .ok_or_else(|| CodecError::Schema(format!("record {index}: missing id")))?;
    let text = stored
        .text
        .ok_or_else(|| CodecError::Schema(format!("record {index}: missing text")))?;
    if text.trim().is_empty() {
        return Err(CodecError::Schema(format!("record {index}: empty text")));
    }

    Ok(Task {
        id: TaskId::from_string(id),
        text,
        detail: stored.detail.as_deref().and_then(task::normalize_detail),
        completed: stored.completed.unwrap_or(false),
        created_at: stored
            .created_at
            .as_ref()
            .and_then(parse_timestamp)
            .unwrap_or(now),
        priority: stored
            .priority
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
    })
}

/// Parses a persisted timestamp: an RFC 3339 string or epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let ts = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()?
            .with_timezone(&Utc),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)?,
        _ => return None,
    };
    Some(ts.trunc_subsecs(3))
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
