//! Filter selector with per-filter counts.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use tasklist_proto::FilterMode;

use super::theme;
use crate::app::App;
use crate::storage::KeyValueStore;

/// Render the filter tabs, e.g. `[All Tasks 3]  In Progress 2  Completed 1`.
pub fn render<S: KeyValueStore>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let counts = app.store.counts();
    let active = app.store.filter();

    let mut spans = Vec::with_capacity(FilterMode::ALL.len() * 2);
    for mode in FilterMode::ALL {
        let label = format!(" {} {} ", mode.label(), counts.get(mode));
        let style = if mode == active {
            theme::selected()
        } else {
            theme::dimmed()
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
