//! Task list rendering.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tasklist_proto::Task;

use super::theme;
use crate::app::{App, PanelFocus, format_created_at};
use crate::storage::KeyValueStore;

/// Render the visible tasks, or the empty state when there are none.
pub fn render<S: KeyValueStore>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let is_focused = app.focus == PanelFocus::Tasks;
    let block = Block::default()
        .title(app.store.filter().label())
        .borders(Borders::ALL)
        .border_style(if is_focused {
            theme::highlighted()
        } else {
            theme::normal()
        });

    let tasks = app.visible_tasks();
    if tasks.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled("No tasks found", theme::bold())),
            Line::from(Span::styled("Add a new task to get started", theme::dimmed())),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| task_item(task, app.expanded.contains(&task.id), app.timestamp_format()))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(if is_focused {
            theme::selected()
        } else {
            theme::bold()
        });

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn task_item<'a>(task: &'a Task, expanded: bool, timestamp_format: &str) -> ListItem<'a> {
    let checkbox = if task.completed { "[✓]" } else { "[ ]" };
    let text_style = if task.completed {
        theme::completed()
    } else {
        theme::normal()
    };
    let detail_marker = match (&task.detail, expanded) {
        (Some(_), true) => " ▾",
        (Some(_), false) => " ▸",
        (None, _) => "",
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(checkbox, text_style),
        Span::raw(" "),
        Span::styled(&task.text, text_style),
        Span::styled(detail_marker, theme::dimmed()),
        Span::raw("  "),
        Span::styled(format!("[{}]", task.priority), theme::priority_badge(task.priority)),
        Span::raw(" "),
        Span::styled(
            format_created_at(&task.created_at, timestamp_format),
            theme::timestamp(),
        ),
    ])];

    if let Some(detail) = task.detail.as_deref().filter(|_| expanded) {
        lines.extend(
            detail
                .lines()
                .map(|line| Line::from(Span::styled(format!("    {line}"), theme::dimmed()))),
        );
    }

    ListItem::new(lines)
}
