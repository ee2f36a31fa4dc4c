use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::AnalysisKind;
use crate::tui::app::{App, PanelResult, View};

use super::*;

/// Analysis tabs: the input box always has focus.
pub(super) fn handle_analysis(app: &mut App, kind: AnalysisKind, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => app.view = View::Tasks,
        // Alt-Enter inserts a line break for multi-line plans
        (m, KeyCode::Enter) if m.contains(KeyModifiers::ALT) => {
            let panel = app.panel_mut(kind);
            let at = panel.cursor.min(panel.input.len());
            panel.input.insert(at, '\n');
            panel.cursor = at + 1;
        }
        (_, KeyCode::Enter) => app.submit_analysis(kind),
        // Ctrl-L clears input and result
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
            let panel = app.panel_mut(kind);
            panel.input.clear();
            panel.cursor = 0;
            panel.result = PanelResult::Empty;
        }
        _ => {
            let panel = app.panel_mut(kind);
            edit_line(&mut panel.input, &mut panel.cursor, key);
        }
    }
}
