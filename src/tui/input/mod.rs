mod analysis;
mod common;
mod edit;
mod mouse;
mod move_mode;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent};

use super::app::{App, Mode, View};

// Import all submodule functions into this module's namespace
// so that submodules can access cross-module functions via `use super::*;`
#[allow(unused_imports)]
use analysis::*;
#[allow(unused_imports)]
use common::*;
#[allow(unused_imports)]
use edit::*;
#[allow(unused_imports)]
use move_mode::*;
#[allow(unused_imports)]
use navigate::*;

/// Handle a key event in the current view and mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    if is_ctrl_c(&key) {
        app.should_quit = true;
        return;
    }

    // Help overlay swallows the next key
    if app.show_help {
        app.show_help = false;
        return;
    }

    let key = normalize_key(key);

    // Tab switching, except while a form or drag owns the keyboard
    if app.mode == Mode::Navigate {
        match key.code {
            KeyCode::Tab => {
                app.view = app.view.next();
                return;
            }
            KeyCode::BackTab => {
                app.view = app.view.prev();
                return;
            }
            _ => {}
        }
    }

    match app.view {
        View::Analysis(kind) => handle_analysis(app, kind, key),
        View::Tasks => match app.mode {
            Mode::Navigate => handle_navigate(app, key),
            Mode::Edit => handle_edit(app, key),
            Mode::Move => handle_move(app, key),
        },
    }
}

/// Handle a mouse event (drag-and-drop on the task list)
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    mouse::handle_mouse(app, mouse);
}
