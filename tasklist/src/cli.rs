//! One-shot subcommands operating on the task store.
//!
//! ```bash
//! tasklist add "Buy milk" --priority high
//! tasklist list --filter active
//! tasklist toggle 0190f3
//! tasklist edit 0190f3 --text "Buy oat milk" --detail "2%"
//! tasklist delete 0190f3
//! ```
//!
//! Task ids may be abbreviated to any unique prefix.

use std::io::{self, Write};

use tasklist_proto::{FilterMode, Priority, Task, TaskId};

use crate::app::format_created_at;
use crate::storage::KeyValueStore;
use crate::tasks::{Outcome, TaskStore};

/// Subcommands available without the interactive UI.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a new task.
    Add {
        /// Short task label.
        text: String,
        /// Optional longer note.
        #[arg(short, long, default_value = "")]
        detail: String,
        /// Priority (low, medium, high).
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },
    /// List tasks.
    List {
        /// Which tasks to show (all, active, completed).
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,
    },
    /// Flip a task between done and not done.
    Toggle {
        /// Task id or unique id prefix.
        id: String,
    },
    /// Change a task's text, detail or priority.
    Edit {
        /// Task id or unique id prefix.
        id: String,
        /// New label (unchanged if omitted).
        #[arg(short, long)]
        text: Option<String>,
        /// New note; an empty string clears it (unchanged if omitted).
        #[arg(short, long)]
        detail: Option<String>,
        /// New priority (unchanged if omitted).
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Delete a task.
    Delete {
        /// Task id or unique id prefix.
        id: String,
    },
}

/// Runs `command` against `store`, writing results to `out` and problems
/// to `err`.
///
/// Returns `Ok(true)` if the command did what was asked, `Ok(false)` if it
/// was rejected or referred to an unknown task.
///
/// # Errors
///
/// Returns an I/O error only if writing to `out` or `err` fails.
pub fn run_command<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    command: Command,
    timestamp_format: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<bool> {
    let succeeded = match command {
        Command::Add {
            text,
            detail,
            priority,
        } => {
            let outcome = store.add_task(&text, &detail, priority);
            report(&outcome, out, err)?
        }
        Command::List { filter } => {
            store.set_filter(filter);
            let visible = store.visible_tasks();
            if visible.is_empty() {
                writeln!(out, "No tasks found")?;
            }
            for task in visible {
                write_task(out, task, timestamp_format)?;
            }
            true
        }
        Command::Toggle { id } => match resolve_id(store, &id, err)? {
            Some(id) => {
                let outcome = store.toggle_complete(&id);
                report(&outcome, out, err)?
            }
            None => false,
        },
        Command::Edit {
            id,
            text,
            detail,
            priority,
        } => match resolve_id(store, &id, err)? {
            Some(id) => {
                let Some(current) = store.get(&id) else {
                    return Ok(false);
                };
                let text = text.unwrap_or_else(|| current.text.clone());
                let detail = detail.unwrap_or_else(|| current.detail.clone().unwrap_or_default());
                let priority = priority.unwrap_or(current.priority);
                let outcome = store.edit_task(&id, &text, &detail, priority);
                report(&outcome, out, err)?
            }
            None => false,
        },
        Command::Delete { id } => match resolve_id(store, &id, err)? {
            Some(id) => {
                let outcome = store.delete_task(&id);
                report(&outcome, out, err)?
            }
            None => false,
        },
    };

    for warning in store.take_warnings() {
        writeln!(err, "warning: {warning}")?;
    }
    Ok(succeeded)
}

/// Finds the task whose id equals `query` or uniquely starts with it.
fn resolve_id<S: KeyValueStore>(
    store: &TaskStore<S>,
    query: &str,
    err: &mut impl Write,
) -> io::Result<Option<TaskId>> {
    let query = query.trim();
    if let Some(task) = store.tasks().iter().find(|t| t.id.as_str() == query) {
        return Ok(Some(task.id.clone()));
    }
    if query.is_empty() {
        writeln!(err, "error: no task id given")?;
        return Ok(None);
    }

    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id.as_str().starts_with(query))
        .collect();
    match matches.as_slice() {
        [task] => Ok(Some(task.id.clone())),
        [] => {
            writeln!(err, "error: no task with id {query}")?;
            Ok(None)
        }
        _ => {
            writeln!(
                err,
                "error: id prefix {query} matches {} tasks",
                matches.len()
            )?;
            Ok(None)
        }
    }
}

fn report(outcome: &Outcome, out: &mut impl Write, err: &mut impl Write) -> io::Result<bool> {
    match outcome {
        Outcome::Added(id) => writeln!(out, "Task added successfully ({id})")?,
        Outcome::Toggled { completed: true } => writeln!(out, "Task completed")?,
        Outcome::Toggled { completed: false } => writeln!(out, "Task marked as incomplete")?,
        Outcome::Updated => writeln!(out, "Task updated successfully")?,
        Outcome::Deleted => writeln!(out, "Task deleted")?,
        Outcome::Rejected(reason) => writeln!(err, "error: {reason}")?,
        Outcome::NotFound => writeln!(err, "error: task not found")?,
    }
    Ok(outcome.is_applied())
}

fn write_task(out: &mut impl Write, task: &Task, timestamp_format: &str) -> io::Result<()> {
    let checkbox = if task.completed { "[x]" } else { "[ ]" };
    writeln!(
        out,
        "{checkbox} {id}  {priority:<6}  {text}  ({created})",
        id = task.id,
        priority = task.priority,
        text = task.text,
        created = format_created_at(&task.created_at, timestamp_format),
    )?;
    if let Some(detail) = &task.detail {
        for line in detail.lines() {
            writeln!(out, "      {line}")?;
        }
    }
    Ok(())
}
