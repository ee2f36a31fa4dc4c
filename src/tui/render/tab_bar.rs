use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::Filter;
use crate::ops::view;
use crate::tui::app::{App, PanelResult, View};

/// Render the tab bar: one tab per view, with a separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render tabs and return the column positions of each separator character.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let bg = app.theme.background;
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols: Vec<usize> = Vec::new();
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    // Leading icon
    spans.push(Span::styled(" ", Style::default().bg(bg)));
    spans.push(Span::styled(
        "\u{25B6}",
        Style::default().fg(app.theme.purple).bg(bg),
    ));
    spans.push(Span::styled(" ", Style::default().bg(bg)));

    for tab in View::TABS {
        let is_current = app.view == tab;
        let style = tab_style(app, is_current);
        spans.push(Span::styled(format!(" {} ", tab.title()), style));
        if let View::Analysis(kind) = tab
            && app.panel(kind).is_some_and(|p| p.result == PanelResult::Pending)
        {
            let tab_bg = if is_current { app.theme.selection_bg } else { bg };
            spans.push(Span::styled(
                "\u{2026} ",
                Style::default().fg(app.theme.yellow).bg(tab_bg),
            ));
        }
        sep_cols.push(spans.iter().map(|s| s.content.chars().count()).sum());
        spans.push(sep.clone());
    }

    let tabs = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(tabs, area);
    sep_cols
}

/// Separator line; on the Tasks tab it carries the filter and counts.
fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let bg = app.theme.background;
    let dim = app.theme.dim;

    let mut indicator_spans: Vec<Span> = Vec::new();
    if app.view == View::Tasks {
        let counts = view::counts(&app.tasks);
        if app.filter != Filter::All {
            indicator_spans.push(Span::styled(
                "filter: ",
                Style::default().fg(app.theme.purple).bg(bg),
            ));
            indicator_spans.push(Span::styled(
                app.filter.as_str(),
                Style::default().fg(app.theme.highlight).bg(bg),
            ));
            indicator_spans.push(Span::styled("  ", Style::default().bg(bg)));
        }
        indicator_spans.push(Span::styled(
            format!("{} open \u{00B7} {} done", counts.active, counts.completed),
            Style::default().fg(app.theme.text).bg(bg),
        ));
    }

    let indicator_width: usize = indicator_spans
        .iter()
        .map(|s| s.content.chars().count())
        .sum();
    // +2: one space before indicator, one space after (right edge buffer)
    let separator_end = if indicator_spans.is_empty() {
        width
    } else {
        width.saturating_sub(indicator_width + 2)
    };

    let sep_text: String = (0..separator_end)
        .map(|col| {
            if sep_cols.contains(&col) {
                '\u{2534}'
            } else {
                '\u{2500}'
            }
        })
        .collect();

    let mut spans = vec![Span::styled(sep_text, Style::default().fg(dim).bg(bg))];
    if !indicator_spans.is_empty() {
        spans.push(Span::styled(" ", Style::default().bg(bg)));
        spans.extend(indicator_spans);
    }
    let line = Line::from(spans);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn test_tabs_and_counts() {
        let app = app_with_tasks(&[("a", false, None), ("b", true, None), ("c", false, None)]);
        let output = render_to_string(TERM_W, 2, |frame, area| {
            render_tab_bar(frame, &app, area);
        });
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].contains(" Tasks \u{2502} Eisenhower \u{2502} Laborit \u{2502} Yerkes-Dodson "));
        assert!(lines[1].ends_with("2 open \u{00B7} 1 done"));
        assert!(!lines[1].contains("filter:"));
    }

    #[test]
    fn test_filter_indicator() {
        let mut app = app_with(&["a"]);
        app.filter = Filter::Completed;
        let output = render_to_string(TERM_W, 2, |frame, area| {
            render_tab_bar(frame, &app, area);
        });
        assert!(output.contains("filter: completed"));
    }

    #[test]
    fn test_analysis_tab_has_no_counts() {
        let mut app = app_with(&["a"]);
        app.view = View::Analysis(crate::model::AnalysisKind::Laborit);
        let output = render_to_string(TERM_W, 2, |frame, area| {
            render_tab_bar(frame, &app, area);
        });
        assert!(!output.contains("open"));
    }
}
