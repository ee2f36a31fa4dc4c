use chrono::NaiveDate;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::store::TaskStore;
use crate::model::Config;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App over an in-memory store holding `texts`, in order.
pub fn app_with(texts: &[&str]) -> App {
    let store = TaskStore::in_memory();
    for text in texts {
        store.add(text, None).unwrap();
    }
    App::new(store, &Config::default())
}

/// Like `app_with`, with `(text, completed, due)` per task.
pub fn app_with_tasks(tasks: &[(&str, bool, Option<&str>)]) -> App {
    let store = TaskStore::in_memory();
    for (text, completed, due) in tasks {
        let due = due.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap());
        let id = store.add(text, due).unwrap();
        if *completed {
            store.toggle(id).unwrap();
        }
    }
    App::new(store, &Config::default())
}
