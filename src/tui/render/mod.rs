pub mod analysis_view;
pub mod help_overlay;
pub mod list_view;
pub mod status_row;
pub mod tab_bar;

#[cfg(test)]
pub(crate) mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, View};

/// Main render function: dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: tab bar (2 rows) | content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // tab bar + separator
            Constraint::Min(1),    // content area
            Constraint::Length(1), // status row
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);

    match app.view {
        View::Tasks => list_view::render_list_view(frame, app, chunks[1]),
        View::Analysis(kind) => {
            app.list_area = None;
            analysis_view::render_analysis_view(frame, app, kind, chunks[1]);
        }
    }

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// Split `text` at byte offset `cursor` and put a block cursor there.
pub(super) fn with_cursor(text: &str, cursor: usize) -> (String, String) {
    let at = cursor.min(text.len());
    let at = if text.is_char_boundary(at) { at } else { text.len() };
    (text[..at].to_string(), text[at..].to_string())
}
