use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::*;

/// Add/edit form: text field and due-date field
pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(edit) = &mut app.edit {
                edit.switch_field();
            }
        }
        _ => {
            if let Some(edit) = &mut app.edit {
                let (buffer, cursor) = edit.focused_mut();
                edit_line(buffer, cursor, key);
            }
        }
    }
}
