use chrono::{Local, NaiveDate};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::{Filter, Task};
use crate::tui::app::{App, EditField, EditState, Mode};
use crate::util::unicode;

use super::with_cursor;

/// Render the task list for the current filter
pub fn render_list_view(frame: &mut Frame, app: &mut App, area: Rect) {
    app.list_area = Some(area);
    let today = Local::now().date_naive();
    let bg = app.theme.background;

    let tasks: Vec<Task> = app.display_tasks().into_iter().cloned().collect();
    let adding = app.mode == Mode::Edit && app.edit.as_ref().is_some_and(|e| e.target.is_none());
    let total = tasks.len() + usize::from(adding);

    // Keep the cursor (or the new-task row) on screen
    let visible_height = area.height as usize;
    let focus = if adding { tasks.len() } else { app.cursor };
    if focus < app.scroll_offset {
        app.scroll_offset = focus;
    } else if visible_height > 0 && focus >= app.scroll_offset + visible_height {
        app.scroll_offset = focus + 1 - visible_height;
    }
    app.scroll_offset = app.scroll_offset.min(total.saturating_sub(1));

    if total == 0 {
        let msg = match app.filter {
            Filter::All => " No tasks. Press a to add one.",
            Filter::Active => " No active tasks",
            Filter::Completed => " No completed tasks",
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(app.theme.dim).bg(bg));
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    for (i, task) in tasks
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(visible_height)
    {
        let editing = app
            .edit
            .as_ref()
            .filter(|e| app.mode == Mode::Edit && e.target == Some(task.id));
        let line = match editing {
            Some(edit) => edit_line(app, edit, task.completed, width),
            None => task_line(app, task, i == app.cursor, width, today),
        };
        lines.push(line);
    }
    if adding
        && lines.len() < visible_height
        && let Some(edit) = &app.edit
    {
        lines.push(edit_line(app, edit, false, width));
    }

    let paragraph = Paragraph::new(lines).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn task_line<'a>(app: &App, task: &Task, selected: bool, width: usize, today: NaiveDate) -> Line<'a> {
    let theme = &app.theme;
    let row_bg = if selected { theme.selection_bg } else { theme.background };
    let dragging = selected && app.mode == Mode::Move;

    let marker = if dragging {
        "\u{2195}"
    } else if selected {
        "\u{258E}"
    } else {
        " "
    };
    let checkbox_color = if task.completed { theme.green } else { theme.dim };
    let mut text_style = if task.completed {
        Style::default()
            .fg(theme.dim)
            .bg(row_bg)
            .add_modifier(Modifier::CROSSED_OUT)
    } else if selected {
        Style::default().fg(theme.text_bright).bg(row_bg)
    } else {
        Style::default().fg(theme.text).bg(row_bg)
    };
    if dragging {
        text_style = text_style.fg(theme.highlight).add_modifier(Modifier::BOLD);
    }

    let due = task.due_str().map(|d| format!("  {}", d)).unwrap_or_default();
    // marker + space + "[ ] "
    let prefix_width = 6;
    let text_budget = width.saturating_sub(prefix_width + unicode::display_width(&due));
    let text = unicode::truncate_to_width(&task.text, text_budget);

    let mut spans = vec![
        Span::styled(
            marker,
            Style::default().fg(theme.selection_border).bg(row_bg),
        ),
        Span::styled(" ", Style::default().bg(row_bg)),
        Span::styled(
            format!("{} ", task.checkbox()),
            Style::default().fg(checkbox_color).bg(row_bg),
        ),
        Span::styled(text, text_style),
    ];
    if !due.is_empty() {
        spans.push(Span::styled(
            due,
            Style::default().fg(theme.due_color(task, today)).bg(row_bg),
        ));
    }
    // Fill the rest of the row so the selection background spans the width
    let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    if selected && used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(row_bg)));
    }
    Line::from(spans)
}

fn edit_line<'a>(app: &App, edit: &EditState, completed: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let row_bg = theme.selection_bg;
    let cursor_style = Style::default().fg(theme.highlight).bg(row_bg);
    let active = Style::default().fg(theme.text_bright).bg(row_bg);
    let inactive = Style::default().fg(theme.text).bg(row_bg);
    let label = Style::default().fg(theme.dim).bg(row_bg);

    let checkbox = if completed { "[x] " } else { "[ ] " };
    let mut spans = vec![
        Span::styled("\u{258E} ", Style::default().fg(theme.selection_border).bg(row_bg)),
        Span::styled(checkbox, label),
    ];

    match edit.field {
        EditField::Text => {
            let (before, after) = with_cursor(&edit.text, edit.text_cursor);
            spans.push(Span::styled(before, active));
            spans.push(Span::styled("\u{258C}", cursor_style));
            spans.push(Span::styled(after, active));
        }
        EditField::Due => spans.push(Span::styled(edit.text.clone(), inactive)),
    }

    spans.push(Span::styled("  due: ", label));
    match edit.field {
        EditField::Due => {
            let (before, after) = with_cursor(&edit.due, edit.due_cursor);
            spans.push(Span::styled(before, active));
            spans.push(Span::styled("\u{258C}", cursor_style));
            spans.push(Span::styled(after, active));
        }
        EditField::Text if edit.due.is_empty() => {
            spans.push(Span::styled("YYYY-MM-DD", label));
        }
        EditField::Text => spans.push(Span::styled(edit.due.clone(), inactive)),
    }

    let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(row_bg)));
    }
    Line::from(spans)
}
