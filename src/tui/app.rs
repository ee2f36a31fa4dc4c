use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use crate::cli::handlers::Context;
use crate::io::analysis::{AnalysisClient, AnalysisReply};
use crate::io::clipboard;
use crate::io::store::TaskStore;
use crate::io::watcher::TaskFileWatcher;
use crate::model::{AnalysisKind, Config, Filter, Task, TaskId, parse_due_date};
use crate::ops::drag::DragState;
use crate::ops::{export, task_ops, view};

use super::input;
use super::render;
use super::theme::Theme;

/// How long a status message stays on screen
pub const STATUS_TTL: Duration = Duration::from_secs(5);

/// Which tab is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Tasks,
    Analysis(AnalysisKind),
}

impl View {
    /// Tab order
    pub const TABS: [View; 4] = [
        View::Tasks,
        View::Analysis(AnalysisKind::Eisenhower),
        View::Analysis(AnalysisKind::Laborit),
        View::Analysis(AnalysisKind::YerkesDodson),
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::Tasks => "Tasks",
            View::Analysis(kind) => kind.title(),
        }
    }

    fn index(self) -> usize {
        View::TABS.iter().position(|v| *v == self).unwrap_or(0)
    }

    pub fn next(self) -> View {
        View::TABS[(self.index() + 1) % View::TABS.len()]
    }

    pub fn prev(self) -> View {
        View::TABS[(self.index() + View::TABS.len() - 1) % View::TABS.len()]
    }
}

/// Current interaction mode on the Tasks tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Adding or editing a task
    Edit,
    /// A row is being dragged (keyboard or mouse)
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Text,
    Due,
}

/// In-progress add or edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    /// `None` when adding a new task
    pub target: Option<TaskId>,
    pub text: String,
    pub text_cursor: usize,
    pub due: String,
    pub due_cursor: usize,
    pub field: EditField,
}

impl EditState {
    pub fn new_task() -> Self {
        EditState {
            target: None,
            text: String::new(),
            text_cursor: 0,
            due: String::new(),
            due_cursor: 0,
            field: EditField::Text,
        }
    }

    pub fn for_task(task: &Task) -> Self {
        let due = task.due_str().unwrap_or_default();
        EditState {
            target: Some(task.id),
            text_cursor: task.text.len(),
            text: task.text.clone(),
            due_cursor: due.len(),
            due,
            field: EditField::Text,
        }
    }

    /// Buffer and cursor of the focused field
    pub fn focused_mut(&mut self) -> (&mut String, &mut usize) {
        match self.field {
            EditField::Text => (&mut self.text, &mut self.text_cursor),
            EditField::Due => (&mut self.due, &mut self.due_cursor),
        }
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            EditField::Text => EditField::Due,
            EditField::Due => EditField::Text,
        };
    }
}

/// What the result panel of an analysis tab shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelResult {
    #[default]
    Empty,
    Pending,
    Done(String),
    Failed(String),
}

/// Input and last result of one analysis tab
#[derive(Debug, Clone, Default)]
pub struct AnalysisPanel {
    pub input: String,
    pub cursor: usize,
    pub result: PanelResult,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub at: Instant,
}

/// Main application state
pub struct App {
    pub store: TaskStore,
    /// Last collection read from the store, in stored order
    pub tasks: Vec<Task>,
    pub filter: Filter,
    pub view: View,
    pub mode: Mode,
    /// Index into the displayed rows
    pub cursor: usize,
    /// First visible row
    pub scroll_offset: usize,
    pub edit: Option<EditState>,
    pub drag: DragState,
    /// Screen area of the list rows from the last render, for mouse hits
    pub list_area: Option<Rect>,
    pub panels: HashMap<AnalysisKind, AnalysisPanel>,
    pub status: Option<StatusMessage>,
    pub theme: Theme,
    pub show_help: bool,
    pub should_quit: bool,
    pub copy_due_dates: bool,
    client: AnalysisClient,
    reply_tx: Sender<AnalysisReply>,
    reply_rx: Receiver<AnalysisReply>,
    watcher: Option<TaskFileWatcher>,
}

impl App {
    pub fn new(store: TaskStore, config: &Config) -> Self {
        let (reply_tx, reply_rx) = mpsc::channel();
        let panels = AnalysisKind::ALL
            .iter()
            .map(|kind| (*kind, AnalysisPanel::default()))
            .collect();
        let mut app = App {
            store,
            tasks: Vec::new(),
            filter: config.ui.default_filter,
            view: View::Tasks,
            mode: Mode::Navigate,
            cursor: 0,
            scroll_offset: 0,
            edit: None,
            drag: DragState::Idle,
            list_area: None,
            panels,
            status: None,
            theme: Theme::from_config(&config.ui),
            show_help: false,
            should_quit: false,
            copy_due_dates: config.ui.copy_due_dates,
            client: AnalysisClient::new(&config.analysis),
            reply_tx,
            reply_rx,
            watcher: None,
        };
        app.reload();
        app
    }

    // -----------------------------------------------------------------------
    // Rows and selection
    // -----------------------------------------------------------------------

    /// Ids in display order: the live drag order while dragging,
    /// otherwise the filtered collection.
    pub fn display_ids(&self) -> Vec<TaskId> {
        match self.drag.session() {
            Some(session) => session.order.clone(),
            None => view::row_ids(&view::project(&self.tasks, self.filter)),
        }
    }

    /// Tasks in display order
    pub fn display_tasks(&self) -> Vec<&Task> {
        self.display_ids()
            .into_iter()
            .filter_map(|id| task_ops::find_task(&self.tasks, id))
            .collect()
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.display_ids().get(self.cursor).copied()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_id()
            .and_then(|id| task_ops::find_task(&self.tasks, id))
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.display_ids().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Put the cursor on `id` if it is displayed.
    fn select(&mut self, id: TaskId) {
        if let Some(i) = self.display_ids().iter().position(|d| *d == id) {
            self.cursor = i;
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.display_ids().len();
        if len == 0 {
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn panel(&self, kind: AnalysisKind) -> Option<&AnalysisPanel> {
        self.panels.get(&kind)
    }

    pub fn panel_mut(&mut self, kind: AnalysisKind) -> &mut AnalysisPanel {
        self.panels.entry(kind).or_default()
    }

    // -----------------------------------------------------------------------
    // Status line
    // -----------------------------------------------------------------------

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            at: Instant::now(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            at: Instant::now(),
        });
    }

    pub fn expire_status(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| now.duration_since(s.at) >= STATUS_TTL)
        {
            self.status = None;
        }
    }

    // -----------------------------------------------------------------------
    // Task operations (all writes go through the store)
    // -----------------------------------------------------------------------

    /// Re-read the collection. On failure the last good copy stays on screen.
    pub fn reload(&mut self) {
        match self.store.list() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.clamp_cursor();
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Err(e) = self.store.toggle(id) {
            self.set_error(e.to_string());
        }
        self.reload();
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.remove(id) {
            Ok(Some(task)) => self.set_status(format!("deleted \"{}\"", task.text)),
            Ok(None) => {}
            Err(e) => self.set_error(e.to_string()),
        }
        self.reload();
    }

    pub fn clear_completed(&mut self) {
        match self.store.clear_completed() {
            Ok(removed) if removed.is_empty() => self.set_status("no completed tasks"),
            Ok(removed) => self.set_status(format!("cleared {} completed", removed.len())),
            Err(e) => self.set_error(e.to_string()),
        }
        self.reload();
    }

    pub fn cycle_filter(&mut self) {
        let selected = self.selected_id();
        self.filter = self.filter.next();
        self.cursor = 0;
        if let Some(id) = selected {
            self.select(id);
        }
        self.clamp_cursor();
    }

    pub fn copy_all(&mut self) {
        let Some(text) = export::copy_text(&self.tasks, self.copy_due_dates) else {
            self.set_error("no tasks to copy");
            return;
        };
        match clipboard::copy(&text) {
            Ok(_) => self.set_status(format!("copied {} tasks", self.tasks.len())),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Add / edit
    // -----------------------------------------------------------------------

    pub fn begin_add(&mut self) {
        self.edit = Some(EditState::new_task());
        self.mode = Mode::Edit;
    }

    pub fn begin_edit(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.edit = Some(EditState::for_task(task));
        self.mode = Mode::Edit;
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.mode = Mode::Navigate;
    }

    /// Save the edit. Invalid input keeps the editor open with an error.
    pub fn commit_edit(&mut self) {
        let Some(edit) = self.edit.clone() else {
            self.mode = Mode::Navigate;
            return;
        };
        let due = match parse_due_date(&edit.due) {
            Ok(due) => due,
            Err(_) => {
                self.set_error(format!(
                    "invalid due date '{}' (expected YYYY-MM-DD)",
                    edit.due.trim()
                ));
                return;
            }
        };
        let result = match edit.target {
            None => self.store.add(&edit.text, due).map(Some),
            Some(id) => self.store.edit(id, &edit.text, due).map(|found| found.then_some(id)),
        };
        match result {
            Ok(None) => {
                // deleted elsewhere while the editor was open; keep the text
                self.reload();
                self.set_error("task no longer exists");
            }
            Ok(id) => {
                self.edit = None;
                self.mode = Mode::Navigate;
                self.reload();
                if let Some(id) = id {
                    self.select(id);
                }
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Move / drag
    // -----------------------------------------------------------------------

    /// Start dragging the row at `index` in the display order.
    pub fn begin_move_at(&mut self, index: usize) -> bool {
        let ids = self.display_ids();
        let Some(id) = ids.get(index).copied() else {
            return false;
        };
        if !self.drag.start(ids, id) {
            return false;
        }
        self.cursor = index;
        self.mode = Mode::Move;
        true
    }

    pub fn begin_move(&mut self) {
        self.begin_move_at(self.cursor);
    }

    /// Keep the cursor on the dragged row as the order reflows.
    pub fn follow_drag(&mut self) {
        if let Some(session) = self.drag.session() {
            self.cursor = session.item_index();
        }
    }

    /// Commit the drag. A filtered view's new order is merged back into
    /// the full order so hidden tasks keep their slots.
    pub fn commit_move(&mut self) {
        self.mode = Mode::Navigate;
        let Some(outcome) = self.drag.drop() else {
            return;
        };
        if outcome.moved {
            let full = task_ops::ids(&self.tasks);
            let merged = task_ops::merge_visible_order(&full, &outcome.order);
            if let Err(e) = self.store.reorder(&merged) {
                self.set_error(e.to_string());
            }
        }
        self.reload();
        self.select(outcome.item);
    }

    pub fn cancel_move(&mut self) {
        self.mode = Mode::Navigate;
        if let Some(item) = self.drag.cancel() {
            self.select(item);
        }
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Send the panel's input to the backend on a worker thread.
    pub fn submit_analysis(&mut self, kind: AnalysisKind) {
        let input = self.panel_mut(kind).input.clone();
        if input.trim().is_empty() {
            self.set_error(kind.empty_input_message());
            return;
        }
        self.panel_mut(kind).result = PanelResult::Pending;
        self.client.spawn(kind, input, self.reply_tx.clone());
    }

    /// Apply finished analyses. A failure never shows a success message.
    pub fn poll_replies(&mut self) {
        while let Ok(reply) = self.reply_rx.try_recv() {
            match reply.outcome {
                Ok(text) => {
                    self.panel_mut(reply.kind).result = PanelResult::Done(text);
                    self.set_status(reply.kind.success_message());
                }
                Err(e) => {
                    let text = e.failure_text();
                    self.panel_mut(reply.kind).result = PanelResult::Failed(text.clone());
                    self.set_error(text);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn reply_sender(&self) -> Sender<AnalysisReply> {
        self.reply_tx.clone()
    }

    /// Periodic work between input events.
    pub fn tick(&mut self, now: Instant) {
        self.poll_replies();
        let changed = self.watcher.as_ref().is_some_and(|w| w.changed());
        // A reload mid-drag would reflow rows under the pointer; the drop
        // validates against the stored order instead.
        if changed && !self.drag.is_dragging() {
            tracing::debug!("task file changed on disk");
            self.reload();
        }
        self.expire_status(now);
    }
}

pub fn run(ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(ctx.store(), &ctx.config);
    match TaskFileWatcher::start(&ctx.task_path) {
        Ok(watcher) => app.watcher = Some(watcher),
        Err(e) => tracing::warn!(error = %e, "file watcher unavailable"),
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key)
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }
        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::analysis::AnalysisError;
    use crate::tui::render::test_helpers::app_with;
    use pretty_assertions::assert_eq;

    fn texts(app: &App) -> Vec<String> {
        app.display_tasks().iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn test_tabs_cycle() {
        assert_eq!(View::Tasks.next(), View::Analysis(AnalysisKind::Eisenhower));
        assert_eq!(View::Tasks.prev(), View::Analysis(AnalysisKind::YerkesDodson));
        assert_eq!(View::Analysis(AnalysisKind::YerkesDodson).next(), View::Tasks);
    }

    #[test]
    fn test_add_through_editor() {
        let mut app = app_with(&["a"]);
        app.begin_add();
        let edit = app.edit.as_mut().unwrap();
        edit.text = "b".into();
        edit.due = "2025-06-01".into();
        app.commit_edit();
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(texts(&app), vec!["a", "b"]);
        assert_eq!(app.cursor, 1);
        assert_eq!(app.tasks[1].due_str().as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_invalid_due_keeps_editor_open() {
        let mut app = app_with(&[]);
        app.begin_add();
        let edit = app.edit.as_mut().unwrap();
        edit.text = "b".into();
        edit.due = "tomorrow".into();
        app.commit_edit();
        assert_eq!(app.mode, Mode::Edit);
        assert!(app.tasks.is_empty());
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let mut app = app_with(&["a"]);
        app.begin_edit();
        app.edit.as_mut().unwrap().text = "   ".into();
        app.commit_edit();
        assert_eq!(app.mode, Mode::Edit);
        assert_eq!(texts(&app), vec!["a"]);
        assert_eq!(app.status.as_ref().unwrap().text, "task text cannot be empty");
    }

    #[test]
    fn test_edit_of_task_deleted_elsewhere_reports_error() {
        let mut app = app_with(&["a", "b"]);
        app.begin_edit();
        app.edit.as_mut().unwrap().text = "a, revised".into();
        let id = app.selected_id().unwrap();
        app.store.remove(id).unwrap();

        app.commit_edit();
        assert_eq!(app.mode, Mode::Edit);
        assert_eq!(app.edit.as_ref().unwrap().text, "a, revised");
        assert_eq!(texts(&app), vec!["b"]);
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert_eq!(status.text, "task no longer exists");
    }

    #[test]
    fn test_toggle_targets_selected_row_under_filter() {
        let mut app = app_with(&["a", "b", "c"]);
        app.toggle_selected(); // a done
        app.filter = Filter::Active;
        app.clamp_cursor();
        assert_eq!(texts(&app), vec!["b", "c"]);
        app.cursor = 1;
        app.toggle_selected();
        assert!(app.tasks[2].completed);
        assert!(!app.tasks[1].completed);
        assert_eq!(texts(&app), vec!["b"]);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_cycle_filter_keeps_selection() {
        let mut app = app_with(&["a", "b"]);
        app.cursor = 1;
        app.cycle_filter();
        assert_eq!(app.filter, Filter::Active);
        assert_eq!(app.selected_task().unwrap().text, "b");
        app.cycle_filter();
        assert_eq!(app.filter, Filter::Completed);
        assert!(app.selected_id().is_none());
    }

    #[test]
    fn test_delete_and_clear_completed() {
        let mut app = app_with(&["a", "b", "c"]);
        app.delete_selected();
        assert_eq!(texts(&app), vec!["b", "c"]);
        app.toggle_selected();
        app.clear_completed();
        assert_eq!(texts(&app), vec!["c"]);
        assert_eq!(app.status.as_ref().unwrap().text, "cleared 1 completed");
    }

    #[test]
    fn test_move_commit_merges_filtered_order() {
        let mut app = app_with(&["a", "b", "c", "d"]);
        app.cursor = 1;
        app.toggle_selected(); // b done
        app.filter = Filter::Active;
        app.cursor = 2; // d
        app.begin_move();
        assert!(app.drag.nudge(-2));
        app.follow_drag();
        assert_eq!(app.cursor, 0);
        app.commit_move();
        assert_eq!(app.mode, Mode::Navigate);
        let all: Vec<&str> = app.tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(all, vec!["d", "b", "a", "c"]);
        assert_eq!(app.selected_task().unwrap().text, "d");
    }

    #[test]
    fn test_cancel_move_leaves_order() {
        let mut app = app_with(&["a", "b"]);
        app.begin_move();
        app.drag.nudge(1);
        app.cancel_move();
        assert_eq!(texts(&app), vec!["a", "b"]);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_empty_analysis_input_is_not_sent() {
        let mut app = app_with(&[]);
        app.submit_analysis(AnalysisKind::Laborit);
        assert_eq!(app.panel(AnalysisKind::Laborit).unwrap().result, PanelResult::Empty);
        assert_eq!(
            app.status.as_ref().unwrap().text,
            AnalysisKind::Laborit.empty_input_message()
        );
    }

    #[test]
    fn test_failed_reply_shows_error_without_success() {
        let mut app = app_with(&[]);
        app.panel_mut(AnalysisKind::Eisenhower).result = PanelResult::Pending;
        app.reply_sender()
            .send(AnalysisReply {
                kind: AnalysisKind::Eisenhower,
                outcome: Err(AnalysisError::Server("bad input".into())),
            })
            .unwrap();
        app.poll_replies();
        let expected = "An error occurred while processing your request: bad input";
        assert_eq!(
            app.panel(AnalysisKind::Eisenhower).unwrap().result,
            PanelResult::Failed(expected.to_string())
        );
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert_eq!(status.text, expected);
    }

    #[test]
    fn test_successful_reply() {
        let mut app = app_with(&[]);
        app.reply_sender()
            .send(AnalysisReply {
                kind: AnalysisKind::YerkesDodson,
                outcome: Ok("balanced".into()),
            })
            .unwrap();
        app.poll_replies();
        assert_eq!(
            app.panel(AnalysisKind::YerkesDodson).unwrap().result,
            PanelResult::Done("balanced".into())
        );
        assert_eq!(app.status.as_ref().unwrap().text, "daily plan analyzed");
    }

    #[test]
    fn test_status_expires() {
        let mut app = app_with(&[]);
        app.set_status("hello");
        let at = app.status.as_ref().unwrap().at;
        app.expire_status(at + Duration::from_secs(4));
        assert!(app.status.is_some());
        app.expire_status(at + STATUS_TTL);
        assert!(app.status.is_none());
    }

    #[test]
    fn test_copy_with_no_tasks() {
        let mut app = app_with(&[]);
        app.copy_all();
        assert_eq!(app.status.as_ref().unwrap().text, "no tasks to copy");
    }
}
