use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug, PartialEq)]
pub enum FileEvent {
    /// The task file was created, modified or replaced on disk.
    TasksChanged,
}

/// Watches the task file for writes from other processes.
///
/// The parent directory is watched (atomic writes replace the file by
/// rename, which would orphan a watch on the file itself) and events are
/// filtered down to the task file's name.
pub struct TaskFileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

fn is_task_file_event(event: &Event, dir: &Path, file_name: &OsString) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.starts_with(dir) && p.file_name() == Some(file_name.as_os_str()))
}

impl TaskFileWatcher {
    /// Start watching `task_file`. Its directory must exist.
    pub fn start(task_file: &Path) -> Result<Self, notify::Error> {
        let dir: PathBuf = match task_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = dir.canonicalize().unwrap_or(dir);
        let file_name = task_file
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| notify::Error::generic("task file has no file name"))?;

        let (tx, rx) = mpsc::channel();
        let watched_dir = dir.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result
                    && is_task_file_event(&event, &watched_dir, &file_name)
                {
                    let _ = tx.send(FileEvent::TasksChanged);
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(TaskFileWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain pending events without blocking.
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// True if anything changed since the last call; coalesces bursts.
    pub fn changed(&self) -> bool {
        !self.poll().is_empty()
    }
}
