use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, FileLock, LockError};
use crate::io::recovery;
use crate::model::task::{Task, TaskId, parse_due_date};
use crate::ops::task_ops::{self, TaskError};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("{path} is not a task list: {message}")]
    Parse { path: String, message: String },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("task text cannot be empty")]
    EmptyText,
    #[error("new order is not a permutation of the current tasks")]
    NotAPermutation,
}

impl From<TaskError> for StoreError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::EmptyText => StoreError::EmptyText,
            TaskError::NotAPermutation => StoreError::NotAPermutation,
        }
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Where the serialized collection lives.
pub trait Slot {
    /// Current content, or `None` if nothing has been stored yet.
    fn read(&self) -> io::Result<Option<String>>;
    /// Replace the whole content.
    fn write(&self, content: &str) -> io::Result<()>;
    /// Exclusive access for a read-mutate-write, if the slot is shared.
    fn lock(&self) -> Result<Option<FileLock>, LockError>;
    /// Directory for the recovery log, if the slot has one.
    fn recovery_dir(&self) -> Option<&Path>;
    /// Human-readable location for messages.
    fn describe(&self) -> String;
}

/// JSON file on disk, replaced atomically on every write.
pub struct FileSlot {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSlot {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl Slot for FileSlot {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, content: &str) -> io::Result<()> {
        fs::create_dir_all(self.dir())?;
        recovery::atomic_write(&self.path, content.as_bytes())
    }

    fn lock(&self) -> Result<Option<FileLock>, LockError> {
        fs::create_dir_all(self.dir()).map_err(|source| LockError::Create {
            path: self.dir().to_path_buf(),
            source,
        })?;
        FileLock::acquire(&self.path, self.lock_timeout).map(Some)
    }

    fn recovery_dir(&self) -> Option<&Path> {
        Some(self.dir())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process slot with no lock and no recovery log.
#[derive(Default)]
pub struct MemorySlot {
    content: RefCell<Option<String>>,
    fail_writes: Cell<bool>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        MemorySlot {
            content: RefCell::new(Some(content.into())),
            fail_writes: Cell::new(false),
        }
    }

    /// Make every later write fail, as a full disk would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.content.borrow().clone())
    }

    fn write(&self, content: &str) -> io::Result<()> {
        if self.fail_writes.get() {
            return Err(io::Error::other("write refused"));
        }
        *self.content.borrow_mut() = Some(content.to_string());
        Ok(())
    }

    fn lock(&self) -> Result<Option<FileLock>, LockError> {
        Ok(None)
    }

    fn recovery_dir(&self) -> Option<&Path> {
        None
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

// ---------------------------------------------------------------------------
// Stored shape
// ---------------------------------------------------------------------------

/// A record as found on disk. Older files have no ids, and may store an
/// empty string for "no due date".
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(default)]
    id: Option<TaskId>,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    due_date: Option<String>,
}

/// Decode the stored collection. The flag is true when records had to be
/// repaired (missing or duplicate ids, empty due strings) and the file
/// should be rewritten.
fn decode(content: &str) -> Result<(Vec<Task>, bool), String> {
    if content.trim().is_empty() {
        return Ok((Vec::new(), false));
    }
    let stored: Vec<StoredTask> = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let mut repaired = false;
    let mut seen = HashSet::with_capacity(stored.len());
    let mut tasks = Vec::with_capacity(stored.len());
    for record in stored {
        let id = match record.id {
            Some(id) if seen.insert(id) => id,
            _ => {
                repaired = true;
                let id = TaskId::new();
                seen.insert(id);
                id
            }
        };
        let due_date: Option<NaiveDate> = match record.due_date.as_deref() {
            None => None,
            Some(raw) => {
                repaired |= raw.trim().is_empty();
                parse_due_date(raw).map_err(|e| format!("bad dueDate {:?}: {}", raw, e))?
            }
        };
        tasks.push(Task {
            id,
            text: record.text,
            completed: record.completed,
            due_date,
        });
    }
    Ok((tasks, repaired))
}

fn encode(tasks: &[Task]) -> String {
    let mut out = serde_json::to_string_pretty(tasks).unwrap_or_else(|_| "[]".to_string());
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// TaskStore
// ---------------------------------------------------------------------------

/// The single writer of persisted task state.
///
/// Every operation reads the whole collection, applies one change and
/// writes the whole collection back, holding the slot lock throughout.
pub struct TaskStore {
    slot: Box<dyn Slot>,
}

impl TaskStore {
    pub fn new(slot: Box<dyn Slot>) -> Self {
        TaskStore { slot }
    }

    /// Store backed by a JSON file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileSlot::new(path)))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlot::new()))
    }

    pub fn location(&self) -> String {
        self.slot.describe()
    }

    pub fn recovery_dir(&self) -> Option<&Path> {
        self.slot.recovery_dir()
    }

    fn load(&self) -> Result<(Vec<Task>, bool), StoreError> {
        let content = self.slot.read().map_err(|source| StoreError::Read {
            path: self.slot.describe(),
            source,
        })?;
        let Some(content) = content else {
            return Ok((Vec::new(), false));
        };
        decode(&content).map_err(|message| {
            if let Some(dir) = self.slot.recovery_dir() {
                recovery::log_parse_failure(
                    dir,
                    Path::new(&self.slot.describe()),
                    &message,
                    &content,
                );
            }
            tracing::warn!(path = %self.slot.describe(), %message, "task file unreadable");
            StoreError::Parse {
                path: self.slot.describe(),
                message,
            }
        })
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let content = encode(tasks);
        self.slot.write(&content).map_err(|source| {
            if let Some(dir) = self.slot.recovery_dir() {
                recovery::log_write_failure(
                    dir,
                    Path::new(&self.slot.describe()),
                    &source,
                    &content,
                );
            }
            tracing::warn!(path = %self.slot.describe(), error = %source, "task file write failed");
            StoreError::Write {
                path: self.slot.describe(),
                source,
            }
        })
    }

    /// Locked read-mutate-write. `change` returns its result and whether
    /// the collection changed; unchanged collections are not rewritten.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut Vec<Task>) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = self.slot.lock()?;
        let (mut tasks, repaired) = self.load()?;
        let (out, changed) = change(&mut tasks)?;
        if changed || repaired {
            self.save(&tasks)?;
        }
        Ok(out)
    }

    fn log_deleted(&self, removed: &[Task]) {
        if let Some(dir) = self.slot.recovery_dir() {
            recovery::log_deleted_tasks(dir, Path::new(&self.slot.describe()), removed);
        }
    }

    /// Current collection in stored order; empty if nothing is stored.
    pub fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.update(|tasks| Ok((tasks.clone(), false)))
    }

    /// Append a new incomplete task.
    pub fn add(&self, text: &str, due_date: Option<NaiveDate>) -> Result<TaskId, StoreError> {
        let text = task_ops::validate_text(text)?;
        let id = self.update(|tasks| Ok((task_ops::add_task(tasks, text, due_date)?, true)))?;
        tracing::debug!(%id, "task added");
        Ok(id)
    }

    /// Flip completion. `Ok(false)` if no such task.
    pub fn toggle(&self, id: TaskId) -> Result<bool, StoreError> {
        let found = self.update(|tasks| {
            let found = task_ops::toggle_task(tasks, id);
            Ok((found, found))
        })?;
        tracing::debug!(%id, found, "task toggled");
        Ok(found)
    }

    /// Overwrite text and due date (`None` clears it).
    pub fn edit(
        &self,
        id: TaskId,
        text: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<bool, StoreError> {
        let text = task_ops::validate_text(text)?;
        let found = self.update(|tasks| {
            let found = task_ops::edit_task(tasks, id, text, due_date)?;
            Ok((found, found))
        })?;
        tracing::debug!(%id, found, "task edited");
        Ok(found)
    }

    pub fn remove(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let removed = self.update(|tasks| {
            let removed = task_ops::remove_task(tasks, id);
            let changed = removed.is_some();
            Ok((removed, changed))
        })?;
        if let Some(task) = &removed {
            self.log_deleted(std::slice::from_ref(task));
            tracing::debug!(%id, "task removed");
        }
        Ok(removed)
    }

    /// Remove every completed task, returning them.
    pub fn clear_completed(&self) -> Result<Vec<Task>, StoreError> {
        let removed = self.update(|tasks| {
            let removed = task_ops::clear_completed(tasks);
            let changed = !removed.is_empty();
            Ok((removed, changed))
        })?;
        self.log_deleted(&removed);
        tracing::debug!(count = removed.len(), "completed tasks cleared");
        Ok(removed)
    }

    /// Replace the stored order with `order`, a permutation of the ids.
    pub fn reorder(&self, order: &[TaskId]) -> Result<(), StoreError> {
        self.update(|tasks| {
            let changed = task_ops::ids(tasks) != order;
            task_ops::reorder(tasks, order)?;
            Ok(((), changed))
        })?;
        tracing::debug!(len = order.len(), "tasks reordered");
        Ok(())
    }

    /// Move a task to a 0-based position (clamped). `Ok(false)` if no such task.
    pub fn move_to(&self, id: TaskId, position: usize) -> Result<bool, StoreError> {
        let found = self.update(|tasks| {
            let before = task_ops::index_of(tasks, id);
            let found = task_ops::move_task(tasks, id, position);
            let changed = found && before != task_ops::index_of(tasks, id);
            Ok((found, changed))
        })?;
        tracing::debug!(%id, position, found, "task moved");
        Ok(found)
    }
}
