use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode, View};
use crate::util::unicode;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    if let Some(status) = &app.status {
        let color = if status.is_error {
            app.theme.red
        } else {
            app.theme.green
        };
        spans.push(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color).bg(bg),
        ));
    } else if let Some(label) = mode_label(app) {
        spans.push(Span::styled(
            format!(" {}", label),
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let hint = hint(app);
    let content_width: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let hint_width = unicode::display_width(hint);
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn mode_label(app: &App) -> Option<&'static str> {
    if app.view != View::Tasks {
        return None;
    }
    match app.mode {
        Mode::Navigate => None,
        Mode::Edit if app.edit.as_ref().is_some_and(|e| e.target.is_none()) => Some("-- ADD --"),
        Mode::Edit => Some("-- EDIT --"),
        Mode::Move => Some("-- MOVE --"),
    }
}

fn hint(app: &App) -> &'static str {
    match (app.view, app.mode) {
        (View::Analysis(_), _) => "Enter analyze  Alt-Enter newline  Esc back ",
        (View::Tasks, Mode::Navigate) => "? help ",
        (View::Tasks, Mode::Edit) => "Tab field  Enter save  Esc cancel ",
        (View::Tasks, Mode::Move) => "j/k move  Enter drop  Esc cancel ",
    }
}
