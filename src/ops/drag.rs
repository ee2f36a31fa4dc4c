use crate::model::task::TaskId;

/// Vertical extent of a displayed row, in whatever unit the caller uses
/// for pointer positions (terminal rows in the TUI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBox {
    pub id: TaskId,
    pub top: f32,
    pub height: f32,
}

/// Find the row the dragged item should be inserted before.
///
/// Among rows other than the dragged one, picks the row whose midpoint
/// is below `y` and closest to it. `None` means "append at the end".
pub fn drop_target(rows: &[RowBox], dragged: TaskId, y: f32) -> Option<TaskId> {
    let mut closest: Option<(f32, TaskId)> = None;
    for row in rows.iter().filter(|r| r.id != dragged) {
        let offset = y - row.top - row.height / 2.0;
        if offset < 0.0 && closest.is_none_or(|(best, _)| offset > best) {
            closest = Some((offset, row.id));
        }
    }
    closest.map(|(_, id)| id)
}

/// An in-progress drag over the displayed rows
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The row being dragged
    pub item: TaskId,
    /// Live display order, reflowed on every hover
    pub order: Vec<TaskId>,
    /// Display order when the drag started
    pub original: Vec<TaskId>,
}

impl DragSession {
    /// Index of the dragged row in the live order
    pub fn item_index(&self) -> usize {
        self.order
            .iter()
            .position(|id| *id == self.item)
            .unwrap_or(0)
    }

    /// Row boxes for the live order, laid out top-down with equal heights.
    pub fn uniform_layout(&self, origin: f32, row_height: f32) -> Vec<RowBox> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, id)| RowBox {
                id: *id,
                top: origin + i as f32 * row_height,
                height: row_height,
            })
            .collect()
    }

    /// Splice the dragged row immediately before `target`, or at the end.
    fn place_before(&mut self, target: Option<TaskId>) -> bool {
        let before = self.order.clone();
        self.order.retain(|id| *id != self.item);
        let idx = target
            .and_then(|t| self.order.iter().position(|id| *id == t))
            .unwrap_or(self.order.len());
        self.order.insert(idx, self.item);
        self.order != before
    }
}

/// What a completed drag produced
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub item: TaskId,
    /// Final display order to commit
    pub order: Vec<TaskId>,
    /// Whether the order differs from when the drag started
    pub moved: bool,
}

/// Drag-and-drop state machine: `Idle` ⇄ `Dragging`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    /// Begin dragging `item` over the given display order.
    /// Ignored if a drag is already running or `item` is not displayed.
    pub fn start(&mut self, display: Vec<TaskId>, item: TaskId) -> bool {
        if self.is_dragging() || !display.contains(&item) {
            return false;
        }
        *self = DragState::Dragging(DragSession {
            item,
            original: display.clone(),
            order: display,
        });
        true
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn dragged(&self) -> Option<TaskId> {
        self.session().map(|s| s.item)
    }

    /// Pointer moved to `y`: reflow the live order. Returns true if it changed.
    pub fn hover(&mut self, rows: &[RowBox], y: f32) -> bool {
        match self {
            DragState::Dragging(session) => {
                let target = drop_target(rows, session.item, y);
                session.place_before(target)
            }
            DragState::Idle => false,
        }
    }

    /// Hover using equal-height rows laid out from `origin`.
    pub fn hover_uniform(&mut self, origin: f32, row_height: f32, y: f32) -> bool {
        let rows = match self.session() {
            Some(session) => session.uniform_layout(origin, row_height),
            None => return false,
        };
        self.hover(&rows, y)
    }

    /// Shift the dragged row by `delta` slots (keyboard move).
    pub fn nudge(&mut self, delta: isize) -> bool {
        match self {
            DragState::Dragging(session) => {
                let from = session.item_index();
                let last = session.order.len().saturating_sub(1);
                let to = from.saturating_add_signed(delta).min(last);
                if to == from {
                    return false;
                }
                let id = session.order.remove(from);
                session.order.insert(to, id);
                true
            }
            DragState::Idle => false,
        }
    }

    /// Finish the drag, returning the order to commit.
    pub fn drop(&mut self) -> Option<DropOutcome> {
        match std::mem::take(self) {
            DragState::Dragging(session) => Some(DropOutcome {
                item: session.item,
                moved: session.order != session.original,
                order: session.order,
            }),
            DragState::Idle => None,
        }
    }

    /// Abandon the drag; nothing is committed.
    pub fn cancel(&mut self) -> Option<TaskId> {
        let item = self.dragged();
        *self = DragState::Idle;
        item
    }
}
