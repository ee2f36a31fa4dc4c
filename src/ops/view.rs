use crate::model::filter::Filter;
use crate::model::task::{Task, TaskId};

/// One displayed row, pointing back into the unfiltered collection.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub id: TaskId,
    /// Index in the unfiltered collection
    pub position: usize,
    pub task: &'a Task,
}

/// Project the collection through a filter, preserving order.
pub fn project(tasks: &[Task], filter: Filter) -> Vec<Row<'_>> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| filter.matches(task))
        .map(|(position, task)| Row {
            id: task.id,
            position,
            task,
        })
        .collect()
}

/// Ids of the displayed rows, in display order.
pub fn row_ids(rows: &[Row<'_>]) -> Vec<TaskId> {
    rows.iter().map(|r| r.id).collect()
}

/// Per-filter counts for the tab bar / list header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

pub fn counts(tasks: &[Task]) -> Counts {
    let completed = tasks.iter().filter(|t| t.completed).count();
    Counts {
        all: tasks.len(),
        active: tasks.len() - completed,
        completed,
    }
}
