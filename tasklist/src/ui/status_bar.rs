//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, FormField, NoticeKind, PanelFocus};
use crate::storage::KeyValueStore;

/// Render the status bar at the bottom of the screen.
///
/// Shows the current notice if there is one, otherwise key help for the
/// focused panel.
pub fn render<S: KeyValueStore>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let help_text = match app.focus {
        PanelFocus::Form if app.form.is_editing() => {
            "Enter: save | ↑↓: field | Tab: task list | Esc: cancel edit"
        }
        PanelFocus::Form if app.form.field == FormField::Detail => {
            "Enter: add | Alt+Enter: new line | ↑↓: field | Tab: task list | Esc: clear/quit"
        }
        PanelFocus::Form => {
            "Enter: add | ↑↓: field | ←→: cursor/priority | Tab: task list | Esc: clear/quit"
        }
        PanelFocus::Tasks => {
            "jk: move | hl/123: filter | Space: done | Enter: detail | e: edit | d: delete | q: quit"
        }
    };

    let message = app.notice.as_ref().map_or_else(
        || Span::styled(help_text, theme::dimmed()),
        |notice| {
            let color = match notice.kind {
                NoticeKind::Success => theme::SUCCESS,
                NoticeKind::Info => theme::INFO,
                NoticeKind::Error => theme::ERROR,
            };
            Span::styled(notice.text.as_str(), theme::panel_title(color))
        },
    );

    let status_line = Line::from(vec![
        Span::styled(concat!("Tasklist v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        message,
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
