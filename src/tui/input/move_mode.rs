use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

/// Move mode: the selected row follows j/k until dropped
pub(super) fn handle_move(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.drag.nudge(1);
            app.follow_drag();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.drag.nudge(-1);
            app.follow_drag();
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.drag.nudge(isize::MIN);
            app.follow_drag();
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.drag.nudge(isize::MAX);
            app.follow_drag();
        }
        KeyCode::Enter | KeyCode::Char('m') => app.commit_move(),
        KeyCode::Esc => app.cancel_move(),
        _ => {}
    }
}
