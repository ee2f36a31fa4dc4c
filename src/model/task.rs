use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Date format used for due dates everywhere (storage, CLI, TUI).
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Stable identifier assigned to a task when it is created.
///
/// Handlers refer to tasks by id, never by position, so reordering or
/// filtering the list cannot retarget an action at the wrong task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        TaskId(Uuid::new_v4())
    }

    /// Lowercase hex form without hyphens, used for prefix matching.
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }

    /// First 8 hex chars, enough to address a task from the CLI.
    pub fn short(&self) -> String {
        let mut s = self.simple();
        s.truncate(8);
        s
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TaskId)
    }
}

/// A single to-do entry.
///
/// Serialized as `{id, text, completed, dueDate}`; a missing due date is
/// written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Create an incomplete task with a fresh id.
    pub fn new(text: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Task {
            id: TaskId::new(),
            text: text.into(),
            completed: false,
            due_date,
        }
    }

    /// The checkbox shown in listings
    pub fn checkbox(&self) -> &'static str {
        if self.completed { "[x]" } else { "[ ]" }
    }

    /// Due date formatted as `YYYY-MM-DD`, if any.
    pub fn due_str(&self) -> Option<String> {
        self.due_date
            .map(|d| d.format(DUE_DATE_FORMAT).to_string())
    }
}

/// Parse a `YYYY-MM-DD` due date. Empty input means "no due date".
pub fn parse_due_date(s: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DUE_DATE_FORMAT).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let mut task = Task::new("Buy milk", None);
        task.id = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "text": "Buy milk",
                "completed": false,
                "dueDate": null,
            })
        );
    }

    #[test]
    fn test_due_date_serializes_as_iso_date() {
        let task = Task::new("Report", NaiveDate::from_ymd_opt(2025, 6, 1));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["dueDate"], "2025-06-01");
        assert_eq!(task.due_str().as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_parse_due_date() {
        assert_eq!(parse_due_date("").unwrap(), None);
        assert_eq!(parse_due_date("  ").unwrap(), None);
        assert_eq!(
            parse_due_date("2025-12-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        assert!(parse_due_date("31/12/2025").is_err());
        assert!(parse_due_date("2025-02-30").is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Task::new("same", None);
        let b = Task::new("same", None);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.short().len(), 8);
        assert!(a.id.simple().starts_with(&a.id.short()));
    }

    #[test]
    fn test_checkbox() {
        let mut task = Task::new("x", None);
        assert_eq!(task.checkbox(), "[ ]");
        task.completed = true;
        assert_eq!(task.checkbox(), "[x]");
    }
}
