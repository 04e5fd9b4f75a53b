//! Add/edit form rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tasklist_proto::Priority;

use super::theme;
use crate::app::{App, FormField, PanelFocus};
use crate::storage::KeyValueStore;

/// Render the form: text, detail and priority inputs.
pub fn render<S: KeyValueStore>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let is_focused = app.focus == PanelFocus::Form;
    let form = &app.form;

    let lines = vec![
        input_line(
            "Task    ",
            &form.text,
            "What needs to be done?",
            (is_focused && form.field == FormField::Text).then_some(form.cursor),
        ),
        input_line(
            "Details ",
            &form.detail,
            "Add details (optional)",
            (is_focused && form.field == FormField::Detail).then_some(form.cursor),
        ),
        priority_line(form.priority, is_focused && form.field == FormField::Priority),
    ];

    let title = if form.is_editing() {
        "Edit Task"
    } else {
        "Add New Task"
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if is_focused {
            theme::highlighted()
        } else {
            theme::normal()
        });

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One labelled text input; `cursor` is set when the input has focus.
fn input_line<'a>(
    label: &'a str,
    value: &'a str,
    placeholder: &'a str,
    cursor: Option<usize>,
) -> Line<'a> {
    let label_style = if cursor.is_some() {
        theme::highlighted()
    } else {
        theme::dimmed()
    };
    let label = Span::styled(label, label_style);

    // Newlines shown as one glyph each so char indices still match the cursor.
    let mut display: String = value
        .chars()
        .map(|c| if c == '\n' { '↵' } else { c })
        .collect();

    let Some(cursor) = cursor else {
        return if value.is_empty() {
            Line::from(vec![label, Span::styled(placeholder, theme::dimmed())])
        } else {
            Line::from(vec![label, Span::styled(display, theme::normal())])
        };
    };

    // Insert cursor character at cursor position
    let at = display
        .char_indices()
        .nth(cursor)
        .map_or(display.len(), |(i, _)| i);
    display.insert(at, '█');
    Line::from(vec![label, Span::styled(display, theme::normal())])
}

fn priority_line(current: Priority, focused: bool) -> Line<'static> {
    let label_style = if focused {
        theme::highlighted()
    } else {
        theme::dimmed()
    };
    let mut spans = vec![Span::styled("Priority ", label_style)];
    for priority in Priority::ALL {
        let style = if priority == current {
            theme::priority_badge(priority).add_modifier(ratatui::style::Modifier::REVERSED)
        } else {
            theme::dimmed()
        };
        spans.push(Span::styled(format!(" {priority} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}
