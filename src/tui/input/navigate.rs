use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

/// Tasks tab, navigate mode
pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (_, KeyCode::Char('?')) => app.show_help = true,

        (_, KeyCode::Char('j') | KeyCode::Down) => app.move_cursor(1),
        (_, KeyCode::Char('k') | KeyCode::Up) => app.move_cursor(-1),
        (_, KeyCode::Char('g') | KeyCode::Home) => app.cursor = 0,
        (_, KeyCode::Char('G') | KeyCode::End) => {
            app.cursor = app.display_ids().len().saturating_sub(1)
        }

        (_, KeyCode::Char(' ')) => app.toggle_selected(),
        (_, KeyCode::Char('a')) => app.begin_add(),
        (_, KeyCode::Char('e') | KeyCode::Enter) => app.begin_edit(),
        (_, KeyCode::Char('d')) => app.delete_selected(),
        (_, KeyCode::Char('C')) => app.clear_completed(),
        (_, KeyCode::Char('f')) => app.cycle_filter(),
        (_, KeyCode::Char('m')) => app.begin_move(),
        (_, KeyCode::Char('y')) => app.copy_all(),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
            app.reload();
            app.set_status("reloaded");
        }
        _ => {}
    }
}
