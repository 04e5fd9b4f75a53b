//! Application state and event handling.
//!
//! [`App`] holds the task store together with everything that only matters
//! on screen: which panel has focus, the add/edit form, the selected row,
//! expanded details, and the transient notice line. Key events are turned
//! into task store calls, and the returned [`Outcome`]s into notices.

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tasklist_proto::codec::format_timestamp;
use tasklist_proto::{FilterMode, Priority, Task, TaskId};

use crate::storage::KeyValueStore;
use crate::tasks::{Outcome, TaskStore, ValidationError};

/// Which panel is currently focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// The add/edit form (default).
    Form,
    /// The task list.
    Tasks,
}

/// Which input of the form receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Short task label.
    Text,
    /// Optional longer note.
    Detail,
    /// Priority selector.
    Priority,
}

impl FormField {
    /// Next field, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Text => Self::Detail,
            Self::Detail => Self::Priority,
            Self::Priority => Self::Text,
        }
    }

    /// Previous field, wrapping around.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Text => Self::Priority,
            Self::Detail => Self::Text,
            Self::Priority => Self::Detail,
        }
    }
}

/// Tone of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Something was done.
    Success,
    /// Neutral information.
    Info,
    /// Something failed or was destructive.
    Error,
}

/// A short-lived message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Tone, used for colouring.
    pub kind: NoticeKind,
    /// Message text.
    pub text: String,
    /// Remaining event-loop ticks before the notice disappears.
    pub ticks_left: u32,
}

/// State of the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// Text field contents.
    pub text: String,
    /// Detail field contents.
    pub detail: String,
    /// Selected priority.
    pub priority: Priority,
    /// Field receiving input.
    pub field: FormField,
    /// Cursor position in the active text input (character index).
    pub cursor: usize,
    /// Task being edited, or `None` when adding.
    pub editing: Option<TaskId>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            detail: String::new(),
            priority: Priority::Medium,
            field: FormField::Text,
            cursor: 0,
            editing: None,
        }
    }
}

impl TaskForm {
    /// A form pre-filled with `task` for editing.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            detail: task.detail.clone().unwrap_or_default(),
            priority: task.priority,
            field: FormField::Text,
            cursor: task.text.chars().count(),
            editing: Some(task.id.clone()),
        }
    }

    /// Returns `true` if the form edits an existing task.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Returns `true` if the text or detail input holds anything.
    #[must_use]
    pub fn has_input(&self) -> bool {
        !self.text.is_empty() || !self.detail.is_empty()
    }

    /// Moves focus to `field`, placing the cursor at the end of its input.
    pub fn focus_field(&mut self, field: FormField) {
        self.field = field;
        self.cursor = self.active_input().map_or(0, |s| s.chars().count());
    }

    /// Contents of the active text input, if the active field is one.
    #[must_use]
    pub fn active_input(&self) -> Option<&str> {
        match self.field {
            FormField::Text => Some(&self.text),
            FormField::Detail => Some(&self.detail),
            FormField::Priority => None,
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Text => Some(&mut self.text),
            FormField::Detail => Some(&mut self.detail),
            FormField::Priority => None,
        }
    }

    /// Inserts `c` at the cursor unless the input already holds `limit` chars.
    fn insert_char(&mut self, c: char, limit: Option<usize>) {
        let cursor = self.cursor;
        let Some(input) = self.active_input_mut() else {
            return;
        };
        if limit.is_some_and(|max| input.chars().count() >= max) {
            return;
        }
        let at = byte_index(input, cursor);
        input.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor.
    fn backspace(&mut self) {
        let cursor = self.cursor;
        if cursor == 0 {
            return;
        }
        let Some(input) = self.active_input_mut() else {
            return;
        };
        let at = byte_index(input, cursor - 1);
        input.remove(at);
        self.cursor -= 1;
    }

    /// Deletes the character under the cursor.
    fn delete(&mut self) {
        let cursor = self.cursor;
        let Some(input) = self.active_input_mut() else {
            return;
        };
        if cursor < input.chars().count() {
            let at = byte_index(input, cursor);
            input.remove(at);
        }
    }

    fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_cursor_right(&mut self) {
        let len = self.active_input().map_or(0, |s| s.chars().count());
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    fn move_cursor_end(&mut self) {
        self.cursor = self.active_input().map_or(0, |s| s.chars().count());
    }
}

/// Byte offset of the `char_index`-th character (or the end of `s`).
fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(i, _)| i)
}

/// Formats a creation timestamp in local time with a chrono format string.
///
/// Falls back to the RFC 3339 form if the format string is invalid.
#[must_use]
pub fn format_created_at(ts: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", ts.with_timezone(&Local).format(format)).is_err() {
        return format_timestamp(ts);
    }
    out
}

/// Main application state.
pub struct App<S: KeyValueStore> {
    /// The task collection and active filter.
    pub store: TaskStore<S>,
    /// Add/edit form.
    pub form: TaskForm,
    /// Which panel is focused.
    pub focus: PanelFocus,
    /// Selected row in the visible task list.
    pub selected: usize,
    /// Tasks whose detail is shown.
    pub expanded: HashSet<TaskId>,
    /// Current notice, if any.
    pub notice: Option<Notice>,
    /// Whether the app should quit.
    pub should_quit: bool,
    notice_ticks: u32,
    max_text_len: usize,
    timestamp_format: String,
}

impl<S: KeyValueStore> App<S> {
    /// Create an application around an already loaded store.
    #[must_use]
    pub fn new(store: TaskStore<S>) -> Self {
        Self {
            store,
            form: TaskForm::default(),
            focus: PanelFocus::Form,
            selected: 0,
            expanded: HashSet::new(),
            notice: None,
            should_quit: false,
            notice_ticks: 60,
            max_text_len: 256,
            timestamp_format: "%b %-d, %-I:%M %p".to_string(),
        }
    }

    /// Sets how many ticks a notice stays visible.
    #[must_use]
    pub const fn with_notice_ticks(mut self, ticks: u32) -> Self {
        self.notice_ticks = ticks;
        self
    }

    /// Sets the maximum length of the task text input.
    #[must_use]
    pub const fn with_max_text_len(mut self, len: usize) -> Self {
        self.max_text_len = len;
        self
    }

    /// Sets the chrono format used for creation timestamps.
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// The chrono format used for creation timestamps.
    #[must_use]
    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// Tasks under the active filter.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.store.visible_tasks()
    }

    /// The task under the selection, if any.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected).copied()
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                self.reload();
                return;
            }
            (KeyCode::Esc, _) => {
                if self.form.is_editing() {
                    self.cancel_edit();
                } else if self.form.has_input() {
                    self.clear_form();
                } else {
                    self.should_quit = true;
                }
                return;
            }
            (KeyCode::Tab | KeyCode::BackTab, _) => {
                self.toggle_focus();
                return;
            }
            _ => {}
        }

        match self.focus {
            PanelFocus::Form => self.handle_form_key(key),
            PanelFocus::Tasks => self.handle_tasks_key(key),
        }
    }

    /// Handle key event when the form is focused.
    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return;
        }
        let on_priority = self.form.field == FormField::Priority;
        let on_detail = self.form.field == FormField::Detail;
        match key.code {
            KeyCode::Enter if on_detail && key.modifiers.contains(KeyModifiers::ALT) => {
                self.form.insert_char('\n', None);
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Up => self.form.focus_field(self.form.field.prev()),
            KeyCode::Down => self.form.focus_field(self.form.field.next()),
            KeyCode::Left if on_priority => self.form.priority = self.form.priority.prev(),
            KeyCode::Right if on_priority => self.form.priority = self.form.priority.next(),
            KeyCode::Left => self.form.move_cursor_left(),
            KeyCode::Right => self.form.move_cursor_right(),
            KeyCode::Home => self.form.cursor = 0,
            KeyCode::End => self.form.move_cursor_end(),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Delete => self.form.delete(),
            KeyCode::Char(c) if on_priority => match c.to_ascii_lowercase() {
                'l' => self.form.priority = Priority::Low,
                'm' => self.form.priority = Priority::Medium,
                'h' => self.form.priority = Priority::High,
                ' ' => self.form.priority = self.form.priority.next(),
                _ => {}
            },
            KeyCode::Char(c) => {
                let limit = (self.form.field == FormField::Text).then_some(self.max_text_len);
                self.form.insert_char(c, limit);
            }
            _ => {}
        }
    }

    /// Handle key event when the task list is focused.
    fn handle_tasks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                let last = self.visible_tasks().len().saturating_sub(1);
                self.selected = last;
            }
            KeyCode::Left | KeyCode::Char('h') => self.set_filter(self.store.filter().prev()),
            KeyCode::Right | KeyCode::Char('l') => self.set_filter(self.store.filter().next()),
            KeyCode::Char('1') => self.set_filter(FilterMode::All),
            KeyCode::Char('2') => self.set_filter(FilterMode::Active),
            KeyCode::Char('3') => self.set_filter(FilterMode::Completed),
            KeyCode::Char(' ' | 'x') => self.toggle_selected(),
            KeyCode::Enter => self.toggle_expanded(),
            KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('a' | 'n' | 'i') => {
                self.focus = PanelFocus::Form;
                self.form.focus_field(FormField::Text);
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    /// Switch focus between the form and the task list.
    const fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Form => PanelFocus::Tasks,
            PanelFocus::Tasks => PanelFocus::Form,
        };
    }

    /// Submit the form as a new task or as an edit.
    fn submit_form(&mut self) {
        let outcome = match self.form.editing.clone() {
            Some(id) => self.store.edit_task(
                &id,
                &self.form.text,
                &self.form.detail,
                self.form.priority,
            ),
            None => self
                .store
                .add_task(&self.form.text, &self.form.detail, self.form.priority),
        };

        match outcome {
            Outcome::Added(id) => {
                self.notify(NoticeKind::Success, "Task added successfully");
                self.form = TaskForm::default();
                let position = self.visible_tasks().iter().position(|t| t.id == id);
                if let Some(pos) = position {
                    self.selected = pos;
                }
            }
            Outcome::Updated => {
                if let Some(id) = self.form.editing.take() {
                    if self.form.detail.trim().is_empty() {
                        self.expanded.remove(&id);
                    } else {
                        self.expanded.insert(id);
                    }
                }
                self.notify(NoticeKind::Success, "Task updated successfully");
                self.form = TaskForm::default();
                self.focus = PanelFocus::Tasks;
            }
            Outcome::Rejected(ValidationError::TextEmpty) => {
                self.notify(NoticeKind::Error, "Task text cannot be empty");
                self.form.focus_field(FormField::Text);
            }
            Outcome::NotFound => {
                self.notify(NoticeKind::Error, "Task no longer exists");
                self.form = TaskForm::default();
            }
            Outcome::Toggled { .. } | Outcome::Deleted => {}
        }
        self.after_mutation();
    }

    /// Flip completion of the selected task.
    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        match self.store.toggle_complete(&id) {
            Outcome::Toggled { completed: true } => {
                self.notify(NoticeKind::Success, "Task completed");
            }
            Outcome::Toggled { completed: false } => {
                self.notify(NoticeKind::Success, "Task marked as incomplete");
            }
            _ => {}
        }
        self.after_mutation();
    }

    /// Delete the selected task.
    fn delete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        if self.store.delete_task(&id) == Outcome::Deleted {
            self.expanded.remove(&id);
            if self.form.editing.as_ref() == Some(&id) {
                self.form = TaskForm::default();
            }
            self.notify(NoticeKind::Error, "Task deleted");
        }
        self.after_mutation();
    }

    /// Load the selected task into the form for editing.
    fn edit_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.form = TaskForm::for_task(task);
        self.focus = PanelFocus::Form;
    }

    /// Abandon an edit in progress.
    fn cancel_edit(&mut self) {
        self.form = TaskForm::default();
        self.focus = PanelFocus::Tasks;
        self.notify(NoticeKind::Info, "Edit cancelled");
    }

    /// Discard what was typed into the add form.
    fn clear_form(&mut self) {
        self.form = TaskForm::default();
        self.notify(NoticeKind::Info, "Form cleared");
    }

    /// Show or hide the selected task's detail.
    fn toggle_expanded(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if task.detail.is_none() {
            return;
        }
        let id = task.id.clone();
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// Change the active filter and reset the selection.
    pub fn set_filter(&mut self, mode: FilterMode) {
        self.store.set_filter(mode);
        self.selected = 0;
    }

    /// Discard in-memory state and reload tasks from storage.
    pub fn reload(&mut self) {
        self.store.reload();
        self.form = TaskForm::default();
        self.expanded.clear();
        self.selected = 0;
        self.notify(NoticeKind::Info, "Tasks reloaded from storage");
    }

    const fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.visible_tasks().len() {
            self.selected += 1;
        }
    }

    /// Surface storage warnings and keep the selection in range.
    fn after_mutation(&mut self) {
        for warning in self.store.take_warnings() {
            self.notify(NoticeKind::Error, warning.to_string());
        }
        let visible = self.visible_tasks().len();
        if self.selected >= visible {
            self.selected = visible.saturating_sub(1);
        }
    }

    /// Show a notice for the configured number of ticks.
    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
            ticks_left: self.notice_ticks,
        });
    }

    /// Advance time by one event-loop tick, expiring the notice.
    pub fn tick(&mut self) {
        if let Some(notice) = &mut self.notice {
            notice.ticks_left = notice.ticks_left.saturating_sub(1);
            if notice.ticks_left == 0 {
                self.notice = None;
            }
        }
    }
}
