use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::model::AnalysisKind;
use crate::tui::app::{App, PanelResult};

use super::with_cursor;

/// Prompt, input box and result panel for one analysis
pub fn render_analysis_view(frame: &mut Frame, app: &App, kind: AnalysisKind, area: Rect) {
    let bg = app.theme.background;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),      // prompt + blank
            Constraint::Percentage(35), // input
            Constraint::Min(3),         // result
        ])
        .split(area);

    let prompt = Paragraph::new(Line::from(Span::styled(
        format!(" {}", kind.prompt()),
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(bg));
    frame.render_widget(prompt, chunks[0]);

    let panel = app.panel(kind).cloned().unwrap_or_default();
    let border = Style::default().fg(app.theme.selection_border).bg(bg);
    let input_style = Style::default().fg(app.theme.text_bright).bg(bg);

    let (before, after) = with_cursor(&panel.input, panel.cursor);
    let input_text = input_with_cursor(&before, &after, input_style, app);
    let input = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(" Input "),
        )
        .style(Style::default().bg(bg))
        .wrap(Wrap { trim: false });
    frame.render_widget(input, chunks[1]);

    let (body, style) = match &panel.result {
        PanelResult::Empty => (
            "Press Enter to analyze".to_string(),
            Style::default().fg(app.theme.dim).bg(bg),
        ),
        PanelResult::Pending => (
            "analyzing...".to_string(),
            Style::default().fg(app.theme.yellow).bg(bg),
        ),
        PanelResult::Done(text) => (text.clone(), Style::default().fg(app.theme.text).bg(bg)),
        PanelResult::Failed(text) => (text.clone(), Style::default().fg(app.theme.red).bg(bg)),
    };
    let result = Paragraph::new(Text::styled(body, style))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.dim).bg(bg))
                .title(format!(" {} ", kind.title())),
        )
        .style(Style::default().bg(bg))
        .wrap(Wrap { trim: false });
    frame.render_widget(result, chunks[2]);
}

/// Multi-line input with a block cursor between `before` and `after`.
fn input_with_cursor<'a>(before: &str, after: &str, style: Style, app: &App) -> Text<'a> {
    let cursor_style = Style::default()
        .fg(app.theme.highlight)
        .bg(app.theme.background);
    let mut lines: Vec<Line> = Vec::new();

    let before_lines: Vec<&str> = before.split('\n').collect();
    let after_lines: Vec<&str> = after.split('\n').collect();
    let last_before = before_lines.len() - 1;

    for line in &before_lines[..last_before] {
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }
    lines.push(Line::from(vec![
        Span::styled(before_lines[last_before].to_string(), style),
        Span::styled("\u{258C}", cursor_style),
        Span::styled(after_lines[0].to_string(), style),
    ]));
    for line in &after_lines[1..] {
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }
    Text::from(lines)
}
