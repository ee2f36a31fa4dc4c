use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::task::Task;
use crate::ops::view::Row;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    /// 1-based position in the unfiltered list
    pub position: usize,
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(rename = "dueDate")]
    pub due_date: Option<String>,
}

#[derive(Serialize)]
pub struct AddedJson {
    pub position: usize,
    pub id: String,
}

#[derive(Serialize)]
pub struct ClearedJson {
    pub removed: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct AnalysisJson {
    pub analysis: String,
    pub result: String,
}

pub fn task_to_json(position: usize, task: &Task) -> TaskJson {
    TaskJson {
        position,
        id: task.id.to_string(),
        text: task.text.clone(),
        completed: task.completed,
        due_date: task.due_str(),
    }
}

pub fn row_to_json(row: &Row<'_>) -> TaskJson {
    task_to_json(row.position + 1, row.task)
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// `3. [x] Buy milk  (due 2025-06-01)`
pub fn format_task_line(position: usize, task: &Task) -> String {
    let mut line = format!("{}. {} {}", position, task.checkbox(), task.text);
    if let Some(due) = task.due_str() {
        line.push_str(&format!("  (due {})", due));
    }
    line
}

pub fn format_row(row: &Row<'_>) -> String {
    format_task_line(row.position + 1, row.task)
}

/// Padding so that task lines line up under two-digit positions.
pub fn format_listing(rows: &[Row<'_>]) -> Vec<String> {
    let width = rows
        .iter()
        .map(|r| (r.position + 1).to_string().len())
        .max()
        .unwrap_or(1);
    rows.iter()
        .map(|r| {
            let line = format_row(r);
            let pad = width - (r.position + 1).to_string().len();
            format!("{}{}", " ".repeat(pad), line)
        })
        .collect()
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> String {
    entry.to_markdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::Filter;
    use crate::ops::view::project;
    use chrono::NaiveDate;

    #[test]
    fn test_format_task_line() {
        let mut task = Task::new("Buy milk", NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(format_task_line(3, &task), "3. [ ] Buy milk  (due 2025-06-01)");
        task.completed = true;
        task.due_date = None;
        assert_eq!(format_task_line(1, &task), "1. [x] Buy milk");
    }

    #[test]
    fn test_listing_aligns_positions() {
        let tasks: Vec<Task> = (0..10).map(|i| Task::new(format!("t{}", i), None)).collect();
        let rows = project(&tasks, Filter::All);
        let lines = format_listing(&rows);
        assert_eq!(lines[0], " 1. [ ] t0");
        assert_eq!(lines[9], "10. [ ] t9");
    }

    #[test]
    fn test_row_json_uses_unfiltered_position() {
        let mut tasks = vec![Task::new("a", None), Task::new("b", None)];
        tasks[0].completed = true;
        let rows = project(&tasks, Filter::Active);
        let json = serde_json::to_value(row_to_json(&rows[0])).unwrap();
        assert_eq!(json["position"], 2);
        assert_eq!(json["text"], "b");
        assert!(json["dueDate"].is_null());
    }
}
