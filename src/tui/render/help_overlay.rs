use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, View};

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    match app.view {
        View::Tasks => {
            lines.push(Line::from(Span::styled(" Tasks", header_style)));
            add_binding(&mut lines, " \u{2191}\u{2193}/jk", "Move cursor up/down", key_style, desc_style);
            add_binding(&mut lines, " Space", "Toggle done", key_style, desc_style);
            add_binding(&mut lines, " a", "Add task", key_style, desc_style);
            add_binding(&mut lines, " e/Enter", "Edit task", key_style, desc_style);
            add_binding(&mut lines, " d", "Delete task", key_style, desc_style);
            add_binding(&mut lines, " C", "Clear completed", key_style, desc_style);
            add_binding(&mut lines, " f", "Cycle filter", key_style, desc_style);
            add_binding(&mut lines, " y", "Copy all tasks", key_style, desc_style);
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(" Reorder", header_style)));
            add_binding(&mut lines, " m", "Move mode", key_style, desc_style);
            add_binding(&mut lines, "   j/k", "Shift row", key_style, desc_style);
            add_binding(&mut lines, "   Enter/Esc", "Drop / cancel", key_style, desc_style);
            add_binding(&mut lines, " mouse drag", "Drag a row", key_style, desc_style);
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(" Editing", header_style)));
            add_binding(&mut lines, " Tab", "Text / due date", key_style, desc_style);
            add_binding(&mut lines, " Enter/Esc", "Save / cancel", key_style, desc_style);
        }
        View::Analysis(_) => {
            lines.push(Line::from(Span::styled(" Analysis", header_style)));
            add_binding(&mut lines, " Enter", "Analyze input", key_style, desc_style);
            add_binding(&mut lines, " Alt-Enter", "New line", key_style, desc_style);
            add_binding(&mut lines, " Ctrl-L", "Clear input", key_style, desc_style);
            add_binding(&mut lines, " Esc", "Back to tasks", key_style, desc_style);
        }
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" General", header_style)));
    add_binding(&mut lines, " Tab/S-Tab", "Next / previous tab", key_style, desc_style);
    add_binding(&mut lines, " q", "Quit", key_style, desc_style);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.selection_border).bg(bg))
        .title(" Help ")
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 16;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
