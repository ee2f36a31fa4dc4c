use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::tui::app::{App, Mode, View};

/// Row index (in display order) under screen row `y`, clamped to the list.
fn row_at(app: &App, y: u16) -> Option<usize> {
    let area = app.list_area?;
    let len = app.display_ids().len();
    if len == 0 {
        return None;
    }
    let rel = y.saturating_sub(area.y) as usize;
    Some((app.scroll_offset + rel).min(len - 1))
}

fn inside_list(app: &App, column: u16, row: u16) -> bool {
    app.list_area.is_some_and(|a| {
        column >= a.x && column < a.x + a.width && row >= a.y && row < a.y + a.height
    })
}

/// Press starts a drag, motion reflows, release drops.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.view != View::Tasks || app.show_help {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.mode != Mode::Navigate || !inside_list(app, mouse.column, mouse.row) {
                return;
            }
            let Some(area) = app.list_area else {
                return;
            };
            let index = app.scroll_offset + mouse.row.saturating_sub(area.y) as usize;
            if index >= app.display_ids().len() {
                return;
            }
            app.begin_move_at(index);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(row) = row_at(app, mouse.row) else {
                return;
            };
            let Some(current) = app.drag.session().map(|s| s.item_index()) else {
                return;
            };
            // Rows are one unit tall, so a pointer at `row` lands the
            // dragged row on `row` when probed past the midpoint below it.
            let y = if row > current {
                row as f32 + 0.5
            } else {
                row as f32
            };
            if app.drag.hover_uniform(0.0, 1.0, y) {
                app.follow_drag();
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if app.drag.is_dragging() {
                app.commit_move();
            }
        }
        MouseEventKind::ScrollDown if app.mode == Mode::Navigate => app.move_cursor(1),
        MouseEventKind::ScrollUp if app.mode == Mode::Navigate => app.move_cursor(-1),
        _ => {}
    }
}
