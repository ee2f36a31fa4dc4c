use crate::model::task::Task;

/// One line per task: the text, optionally followed by ` (due YYYY-MM-DD)`.
/// Returns `None` when there is nothing to copy.
pub fn copy_text(tasks: &[Task], with_due: bool) -> Option<String> {
    if tasks.is_empty() {
        return None;
    }
    let lines: Vec<String> = tasks
        .iter()
        .map(|task| match task.due_str() {
            Some(due) if with_due => format!("{} (due {})", task.text, due),
            _ => task.text.clone(),
        })
        .collect();
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_has_nothing_to_copy() {
        assert_eq!(copy_text(&[], true), None);
    }

    #[test]
    fn test_joins_with_newlines() {
        let tasks = vec![
            Task::new("Write report", None),
            Task::new("Buy milk", NaiveDate::from_ymd_opt(2025, 6, 1)),
        ];
        assert_eq!(
            copy_text(&tasks, true).unwrap(),
            "Write report\nBuy milk (due 2025-06-01)"
        );
        assert_eq!(copy_text(&tasks, false).unwrap(), "Write report\nBuy milk");
    }

    #[test]
    fn test_includes_completed_tasks() {
        let mut done = Task::new("Done already", None);
        done.completed = true;
        assert_eq!(copy_text(&[done], true).unwrap(), "Done already");
    }
}
