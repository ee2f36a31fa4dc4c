use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::io::lock::try_lock;
use crate::model::task::Task;

/// Log size above which old entries are trimmed on the next append (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Entries older than this many days are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

const FILE_HEADER: &str = "\
<!-- prio recovery log
     Task data prio could not save normally ends up here:
     failed writes, deleted tasks, unreadable task files.
     View with: prio recovery
     Prune old entries: prio recovery prune -->

---
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// The task file could not be parsed
    Parser,
    /// Writing the task file failed
    Write,
    /// Tasks were deleted
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Write => "write",
            RecoveryCategory::Delete => "delete",
        })
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parser" => Some(RecoveryCategory::Parser),
            "write" => Some(RecoveryCategory::Write),
            "delete" => Some(RecoveryCategory::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RecoverySummary {
    pub entry_count: usize,
    pub oldest: Option<DateTime<Utc>>,
}

pub fn recovery_log_path(dir: &Path) -> PathBuf {
    dir.join(".recovery.log")
}

/// Write `content` to `path` via a temp file in the same directory + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Markdown block as it appears in the log.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} [{}] {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

/// Append an entry. Failures are reported on stderr and otherwise ignored.
pub fn log_recovery(dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(dir, &entry) {
        tracing::warn!(error = %e, "could not write recovery log");
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(dir);
    let size = std::fs::metadata(&path).map(|m| m.len()).ok();
    if size.is_some_and(|len| len > MAX_LOG_SIZE) {
        trim_in_place(&path);
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Drop stale entries from an oversized log. Skipped if another process
/// holds the log.
fn trim_in_place(path: &Path) {
    let Ok(file) = OpenOptions::new().read(true).write(true).open(path) else {
        return;
    };
    if try_lock(&file).is_err() {
        return;
    }
    let mut content = String::new();
    if io::BufReader::new(&file).read_to_string(&mut content).is_err() {
        return;
    }
    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);
    if trimmed.len() < content.len()
        && let Ok(mut f) = File::create(path)
    {
        let _ = f.write_all(trimmed.as_bytes());
    }
}

/// Tasks removed by delete or clear-completed.
pub fn log_deleted_tasks(dir: &Path, source: &Path, tasks: &[Task]) {
    if tasks.is_empty() {
        return;
    }
    let description = match tasks {
        [task] => format!("task {} deleted", task.id.short()),
        _ => format!("{} tasks deleted", tasks.len()),
    };
    let body = serde_json::to_string_pretty(tasks).unwrap_or_default();
    log_recovery(
        dir,
        RecoveryEntry::new(RecoveryCategory::Delete, description)
            .field("File", source.display().to_string())
            .body(body),
    );
}

/// The task file write failed; keep what we meant to write.
pub fn log_write_failure(dir: &Path, target: &Path, error: &io::Error, content: &str) {
    log_recovery(
        dir,
        RecoveryEntry::new(RecoveryCategory::Write, "task file write failed")
            .field("File", target.display().to_string())
            .field("Error", error.to_string())
            .body(content),
    );
}

/// The task file exists but is not a task list; keep its raw bytes.
pub fn log_parse_failure(dir: &Path, source: &Path, error: &str, raw: &str) {
    log_recovery(
        dir,
        RecoveryEntry::new(RecoveryCategory::Parser, "task file unreadable")
            .field("File", source.display().to_string())
            .field("Error", error)
            .body(raw),
    );
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Entries newest-first, at most `limit` of them.
pub fn read_recovery_entries(dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

pub fn recovery_summary(dir: &Path) -> Option<RecoverySummary> {
    let content = std::fs::read_to_string(recovery_log_path(dir)).ok()?;
    let entries = parse_entries(&content);
    if entries.is_empty() {
        return None;
    }
    Some(RecoverySummary {
        entry_count: entries.len(),
        oldest: entries.iter().map(|e| e.timestamp).min(),
    })
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((timestamp, category, description)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut in_body = false;

        while let Some(&next) = lines.peek() {
            if !in_body && (next == "---" || next.starts_with("## ")) {
                break;
            }
            lines.next();
            if next.starts_with("```") {
                in_body = !in_body;
            } else if in_body {
                body_lines.push(next);
            } else if let Some((key, value)) = next.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            fields,
            body: body_lines.join("\n"),
        });
    }

    entries
}

/// `<rfc3339> [<category>] <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(" [")?;
    let (category, description) = rest.split_once("] ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    let category = RecoveryCategory::parse_category(category)?;
    Some((timestamp, category, description.to_string()))
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Remove entries older than `before` (default: [`PRUNE_AGE_DAYS`] ago), or
/// every entry with `all`. Returns how many were removed.
pub fn prune_recovery(dir: &Path, before: Option<DateTime<Utc>>, all: bool) -> io::Result<usize> {
    let path = recovery_log_path(dir);
    if !path.exists() {
        return Ok(0);
    }

    let file = OpenOptions::new().read(true).write(true).open(&path)?;
    let mut locked = false;
    for _ in 0..10 {
        if try_lock(&file).is_ok() {
            locked = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    if !locked {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "recovery log is in use, try again later",
        ));
    }

    let content = std::fs::read_to_string(&path)?;
    let before_count = parse_entries(&content).len();

    if all {
        std::fs::write(&path, FILE_HEADER)?;
        return Ok(before_count);
    }

    let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
    let trimmed = prune_entries_before(&content, &cutoff);
    let after_count = parse_entries(&trimmed).len();
    std::fs::write(&path, &trimmed)?;
    Ok(before_count - after_count)
}

/// Raw-text prune that keeps the file header intact.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let mut result = String::new();
    let mut current = String::new();
    let mut current_ts: Option<DateTime<Utc>> = None;
    let mut in_header = true;
    let mut in_body = false;

    let flush = |result: &mut String, current: &mut String, ts: Option<DateTime<Utc>>| {
        if ts.is_some_and(|ts| ts >= *cutoff) {
            result.push_str(current);
        }
        current.clear();
    };

    for line in content.lines() {
        if in_header {
            result.push_str(line);
            result.push('\n');
            in_header = line != "---";
            continue;
        }
        if line.starts_with("```") {
            in_body = !in_body;
        } else if !in_body && let Some(header) = line.strip_prefix("## ") {
            flush(&mut result, &mut current, current_ts);
            current_ts = parse_entry_header(header).map(|(ts, _, _)| ts);
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&mut result, &mut current, current_ts);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use tempfile::TempDir;

    fn entry(category: RecoveryCategory, desc: &str, body: &str) -> RecoveryEntry {
        RecoveryEntry::new(category, desc)
            .field("File", "/tmp/tasks.json")
            .body(body)
    }

    fn aged(days: i64, desc: &str) -> RecoveryEntry {
        let mut e = entry(RecoveryCategory::Parser, desc, "");
        e.timestamp = Utc::now() - chrono::Duration::days(days);
        e
    }

    #[test]
    fn test_markdown_layout() {
        let md = entry(RecoveryCategory::Write, "task file write failed", "[]").to_markdown();
        assert!(md.starts_with("## "));
        assert!(md.contains("[write] task file write failed"));
        assert!(md.contains("File: /tmp/tasks.json"));
        assert!(md.contains("```\n[]\n```"));
        assert!(md.ends_with("---\n"));
    }

    #[test]
    fn test_no_fence_without_body() {
        let md = RecoveryEntry::new(RecoveryCategory::Delete, "x").to_markdown();
        assert!(!md.contains("```"));
    }

    #[test]
    fn test_log_then_read_newest_first() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry(RecoveryCategory::Parser, "first", "a"));
        log_recovery(tmp.path(), entry(RecoveryCategory::Write, "second", "b"));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "second");
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert_eq!(entries[1].body, "a");
    }

    #[test]
    fn test_read_limit() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            log_recovery(tmp.path(), entry(RecoveryCategory::Parser, &format!("e{}", i), ""));
        }
        let entries = read_recovery_entries(tmp.path(), Some(2));
        let names: Vec<_> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["e4", "e3"]);
    }

    #[test]
    fn test_body_with_dashes_survives() {
        let tmp = TempDir::new().unwrap();
        let body = "line one\n---\n## not a header";
        log_recovery(tmp.path(), entry(RecoveryCategory::Parser, "raw", body));
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, body);
        assert_eq!(
            entries[0].fields,
            vec![("File".to_string(), "/tmp/tasks.json".to_string())]
        );
    }

    #[test]
    fn test_header_written_once() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry(RecoveryCategory::Parser, "a", ""));
        log_recovery(tmp.path(), entry(RecoveryCategory::Parser, "b", ""));
        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- prio recovery log"));
        assert_eq!(content.matches("<!-- prio recovery log").count(), 1);
    }

    #[test]
    fn test_log_deleted_tasks() {
        let tmp = TempDir::new().unwrap();
        let tasks = vec![Task::new("Buy milk", None), Task::new("Call bank", None)];
        log_deleted_tasks(tmp.path(), Path::new("tasks.json"), &tasks);
        log_deleted_tasks(tmp.path(), Path::new("tasks.json"), &[]);

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Delete);
        assert_eq!(entries[0].description, "2 tasks deleted");
        let restored: Vec<Task> = serde_json::from_str(&entries[0].body).unwrap();
        assert_eq!(restored, tasks);
    }

    #[test]
    fn test_summary() {
        let tmp = TempDir::new().unwrap();
        assert!(recovery_summary(tmp.path()).is_none());
        log_recovery(tmp.path(), aged(3, "old"));
        log_recovery(tmp.path(), aged(0, "new"));
        let summary = recovery_summary(tmp.path()).unwrap();
        assert_eq!(summary.entry_count, 2);
        assert!(summary.oldest.unwrap() < Utc::now() - chrono::Duration::days(2));
    }

    #[test]
    fn test_prune_default_cutoff() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), aged(60, "stale"));
        log_recovery(tmp.path(), aged(1, "fresh"));

        assert_eq!(prune_recovery(tmp.path(), None, false).unwrap(), 1);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "fresh");
    }

    #[test]
    fn test_prune_keeps_bodies_that_look_like_headers() {
        let tmp = TempDir::new().unwrap();
        let body = "## Heading inside a task\ntext";
        log_recovery(tmp.path(), aged(0, "fresh").body(body));
        assert_eq!(prune_recovery(tmp.path(), None, false).unwrap(), 0);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries[0].body, body);
    }

    #[test]
    fn test_prune_all_keeps_header() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), aged(0, "a"));
        log_recovery(tmp.path(), aged(0, "b"));
        assert_eq!(prune_recovery(tmp.path(), None, true).unwrap(), 2);
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.contains("prio recovery log"));
    }

    #[test]
    fn test_prune_missing_log() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(prune_recovery(tmp.path(), None, true).unwrap(), 0);
    }

    #[test]
    fn test_parse_entry_header() {
        let (ts, cat, desc) =
            parse_entry_header("2026-02-10T14:32:05Z [delete] task 1a2b3c4d deleted").unwrap();
        assert_eq!(ts.year(), 2026);
        assert_eq!(cat, RecoveryCategory::Delete);
        assert_eq!(desc, "task 1a2b3c4d deleted");

        assert!(parse_entry_header("not a header").is_none());
        assert!(parse_entry_header("2026-02-10T14:32:05Z [bogus] x").is_none());
    }

    #[test]
    fn test_to_json() {
        let json = entry(RecoveryCategory::Parser, "task file unreadable", "{").to_json();
        assert_eq!(json["category"], "parser");
        assert_eq!(json["body"], "{");
        assert_eq!(json["fields"]["File"], "/tmp/tasks.json");
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        atomic_write(&path, b"[]").unwrap();
        atomic_write(&path, b"[1]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
    }
}
