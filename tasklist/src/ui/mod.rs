//! Terminal UI rendering.

pub mod filter_tabs;
pub mod form;
pub mod status_bar;
pub mod task_list;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::App;
use crate::storage::KeyValueStore;

/// Main draw function for the entire UI.
pub fn draw<S: KeyValueStore>(frame: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(5), // Form
            Constraint::Length(1), // Filter tabs
            Constraint::Min(3),    // Task list
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let header = Line::from(vec![
        Span::styled("Todo List", theme::panel_title(theme::TITLE)),
        Span::styled(
            "  Manage your tasks efficiently and stay organized",
            theme::dimmed(),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    form::render(frame, chunks[1], app);
    filter_tabs::render(frame, chunks[2], app);
    task_list::render(frame, chunks[3], app);
    status_bar::render(frame, chunks[4], app);
}
