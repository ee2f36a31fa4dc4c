use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::task::{Task, TaskId};

/// Error type for task operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task text cannot be empty")]
    EmptyText,
    #[error("new order is not a permutation of the current tasks")]
    NotAPermutation,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Position of a task in the collection.
pub fn index_of(tasks: &[Task], id: TaskId) -> Option<usize> {
    tasks.iter().position(|t| t.id == id)
}

pub fn find_task(tasks: &[Task], id: TaskId) -> Option<&Task> {
    tasks.iter().find(|t| t.id == id)
}

pub fn find_task_mut(tasks: &mut [Task], id: TaskId) -> Option<&mut Task> {
    tasks.iter_mut().find(|t| t.id == id)
}

/// Ids in collection order
pub fn ids(tasks: &[Task]) -> Vec<TaskId> {
    tasks.iter().map(|t| t.id).collect()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Trim task text, rejecting text that is empty after trimming.
pub fn validate_text(text: &str) -> Result<&str, TaskError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TaskError::EmptyText)
    } else {
        Ok(trimmed)
    }
}

/// Append a new incomplete task. Returns its id.
pub fn add_task(
    tasks: &mut Vec<Task>,
    text: &str,
    due_date: Option<NaiveDate>,
) -> Result<TaskId, TaskError> {
    let text = validate_text(text)?;
    let task = Task::new(text, due_date);
    let id = task.id;
    tasks.push(task);
    Ok(id)
}

/// Flip `completed`. Returns false if the task does not exist.
pub fn toggle_task(tasks: &mut [Task], id: TaskId) -> bool {
    match find_task_mut(tasks, id) {
        Some(task) => {
            task.completed = !task.completed;
            true
        }
        None => false,
    }
}

/// Overwrite text and due date. An empty text is rejected before the
/// task is looked up, so the task is never partially changed.
pub fn edit_task(
    tasks: &mut [Task],
    id: TaskId,
    text: &str,
    due_date: Option<NaiveDate>,
) -> Result<bool, TaskError> {
    let text = validate_text(text)?;
    match find_task_mut(tasks, id) {
        Some(task) => {
            task.text = text.to_string();
            task.due_date = due_date;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub fn remove_task(tasks: &mut Vec<Task>, id: TaskId) -> Option<Task> {
    let idx = index_of(tasks, id)?;
    Some(tasks.remove(idx))
}

/// Drop every completed task, returning the removed ones in order.
pub fn clear_completed(tasks: &mut Vec<Task>) -> Vec<Task> {
    let (done, open): (Vec<Task>, Vec<Task>) = tasks.drain(..).partition(|t| t.completed);
    *tasks = open;
    done
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Rearrange the collection to follow `order`, which must name every
/// existing task exactly once.
pub fn reorder(tasks: &mut Vec<Task>, order: &[TaskId]) -> Result<(), TaskError> {
    if order.len() != tasks.len() {
        return Err(TaskError::NotAPermutation);
    }
    let mut seen = HashSet::with_capacity(order.len());
    if !order.iter().all(|id| seen.insert(*id)) {
        return Err(TaskError::NotAPermutation);
    }
    if !tasks.iter().all(|t| seen.contains(&t.id)) {
        return Err(TaskError::NotAPermutation);
    }

    let mut pool: HashMap<TaskId, Task> = tasks.drain(..).map(|t| (t.id, t)).collect();
    *tasks = order.iter().filter_map(|id| pool.remove(id)).collect();
    Ok(())
}

/// Move a task to `position` (0-based, clamped to the end).
pub fn move_task(tasks: &mut Vec<Task>, id: TaskId, position: usize) -> bool {
    let Some(idx) = index_of(tasks, id) else {
        return false;
    };
    let task = tasks.remove(idx);
    let position = position.min(tasks.len());
    tasks.insert(position, task);
    true
}

/// Merge the new order of a filtered subset back into the full order.
///
/// Slots held by the visible tasks in `full` are refilled with
/// `visible` in its new order; hidden tasks keep their slots. If
/// `visible` is not a permutation of the tasks it replaces, `full`
/// is returned unchanged.
pub fn merge_visible_order(full: &[TaskId], visible: &[TaskId]) -> Vec<TaskId> {
    let visible_set: HashSet<TaskId> = visible.iter().copied().collect();
    let slots = full.iter().filter(|id| visible_set.contains(id)).count();
    if slots != visible.len() || visible_set.len() != visible.len() {
        return full.to_vec();
    }

    let mut next_visible = visible.iter();
    full.iter()
        .map(|id| {
            if visible_set.contains(id) {
                next_visible.next().copied().unwrap_or(*id)
            } else {
                *id
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
