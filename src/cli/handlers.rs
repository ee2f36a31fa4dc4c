use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::analysis::AnalysisClient;
use crate::io::clipboard::{self, ClipboardBackend};
use crate::io::config_io;
use crate::io::recovery;
use crate::io::store::TaskStore;
use crate::model::config::Config;
use crate::model::filter::Filter;
use crate::model::task::{Task, TaskId, parse_due_date};
use crate::ops::{export, task_ops, view};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Minimum id prefix length accepted in place of a position
const MIN_ID_PREFIX: usize = 4;

/// Everything a command needs, resolved once from flags and config.
pub struct Context {
    pub config: Config,
    pub task_path: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config_io::load_config(cli.config.as_deref())?;
        let task_path = config_io::resolve_task_path(&config, cli.file.as_deref());
        Ok(Context {
            config,
            task_path,
            json: cli.json,
        })
    }

    /// Directory holding the task file, recovery log and debug log.
    pub fn data_dir(&self) -> &Path {
        match self.task_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    pub fn store(&self) -> TaskStore {
        TaskStore::open(&self.task_path)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(command: Commands, ctx: &Context) -> CmdResult {
    let store = ctx.store();
    match command {
        Commands::List(args) => cmd_list(args, &store, ctx),
        Commands::Add(args) => cmd_add(args, &store, ctx),
        Commands::Toggle(args) => cmd_toggle(args, &store, ctx),
        Commands::Edit(args) => cmd_edit(args, &store, ctx),
        Commands::Rm(args) => cmd_rm(args, &store, ctx),
        Commands::Mv(args) => cmd_mv(args, &store, ctx),
        Commands::ClearCompleted => cmd_clear_completed(&store, ctx),
        Commands::Copy(args) => cmd_copy(args, &store, ctx),
        Commands::Analyze(args) => cmd_analyze(args, ctx),
        Commands::Recovery(args) => cmd_recovery(args, ctx),
    }
}

// ---------------------------------------------------------------------------
// Argument resolution
// ---------------------------------------------------------------------------

/// Resolve a 1-based position or an id prefix to a task id.
pub fn resolve_task(tasks: &[Task], reference: &str) -> Result<TaskId, String> {
    let reference = reference.trim();
    if let Ok(position) = reference.parse::<usize>() {
        return match position.checked_sub(1).and_then(|i| tasks.get(i)) {
            Some(task) => Ok(task.id),
            None => Err(format!(
                "no task at position {} (the list has {} tasks)",
                position,
                tasks.len()
            )),
        };
    }

    let prefix: String = reference
        .chars()
        .filter(|c| *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    if prefix.len() < MIN_ID_PREFIX || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "'{}' is neither a position nor an id prefix (at least {} hex characters)",
            reference, MIN_ID_PREFIX
        ));
    }

    let mut matches = tasks.iter().filter(|t| t.id.simple().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id),
        (None, _) => Err(format!("no task with id starting '{}'", reference)),
        (Some(_), Some(_)) => Err(format!("id prefix '{}' matches more than one task", reference)),
    }
}

fn parse_due_arg(raw: &str) -> Result<Option<NaiveDate>, String> {
    parse_due_date(raw).map_err(|_| format!("invalid due date '{}' (expected YYYY-MM-DD)", raw))
}

/// Current position (1-based) and task, after a change.
fn locate(store: &TaskStore, id: TaskId) -> Result<(usize, Task), Box<dyn std::error::Error>> {
    let tasks = store.list()?;
    let idx = task_ops::index_of(&tasks, id).ok_or("task no longer exists")?;
    Ok((idx + 1, tasks[idx].clone()))
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, store: &TaskStore, ctx: &Context) -> CmdResult {
    let tasks = store.list()?;
    let filter = args.filter.unwrap_or(ctx.config.ui.default_filter);
    let rows = view::project(&tasks, filter);

    if ctx.json {
        let out: Vec<TaskJson> = rows.iter().map(row_to_json).collect();
        return print_json(&out);
    }
    if rows.is_empty() {
        match filter {
            Filter::All => println!("no tasks"),
            other => println!("no {} tasks", other),
        }
        return Ok(());
    }
    for line in format_listing(&rows) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_add(args: AddArgs, store: &TaskStore, ctx: &Context) -> CmdResult {
    let due = match args.due.as_deref() {
        Some(raw) => parse_due_arg(raw)?,
        None => None,
    };
    let id = store.add(&args.text, due)?;
    let (position, task) = locate(store, id)?;
    if ctx.json {
        return print_json(&AddedJson {
            position,
            id: id.to_string(),
        });
    }
    println!("added {}  [{}]", format_task_line(position, &task), id.short());
    Ok(())
}

fn cmd_toggle(args: TaskArg, store: &TaskStore, ctx: &Context) -> CmdResult {
    let id = resolve_task(&store.list()?, &args.task)?;
    if !store.toggle(id)? {
        return Err("task no longer exists".into());
    }
    let (position, task) = locate(store, id)?;
    if ctx.json {
        return print_json(&task_to_json(position, &task));
    }
    println!("{}", format_task_line(position, &task));
    Ok(())
}

fn cmd_edit(args: EditArgs, store: &TaskStore, ctx: &Context) -> CmdResult {
    let tasks = store.list()?;
    let id = resolve_task(&tasks, &args.task)?;
    let due = if args.no_due {
        None
    } else if let Some(raw) = args.due.as_deref() {
        parse_due_arg(raw)?
    } else {
        task_ops::find_task(&tasks, id).and_then(|t| t.due_date)
    };
    if !store.edit(id, &args.text, due)? {
        return Err("task no longer exists".into());
    }
    let (position, task) = locate(store, id)?;
    if ctx.json {
        return print_json(&task_to_json(position, &task));
    }
    println!("{}", format_task_line(position, &task));
    Ok(())
}

fn cmd_rm(args: TaskArg, store: &TaskStore, ctx: &Context) -> CmdResult {
    let tasks = store.list()?;
    let id = resolve_task(&tasks, &args.task)?;
    let position = task_ops::index_of(&tasks, id).map_or(0, |i| i + 1);
    let removed = store.remove(id)?.ok_or("task no longer exists")?;
    if ctx.json {
        return print_json(&task_to_json(position, &removed));
    }
    println!("deleted: {}", removed.text);
    Ok(())
}

fn cmd_mv(args: MvArgs, store: &TaskStore, ctx: &Context) -> CmdResult {
    if args.position == 0 {
        return Err("position must be 1 or greater".into());
    }
    let id = resolve_task(&store.list()?, &args.task)?;
    if !store.move_to(id, args.position - 1)? {
        return Err("task no longer exists".into());
    }
    let (position, task) = locate(store, id)?;
    if ctx.json {
        return print_json(&task_to_json(position, &task));
    }
    println!("{}", format_task_line(position, &task));
    Ok(())
}

fn cmd_clear_completed(store: &TaskStore, ctx: &Context) -> CmdResult {
    let removed = store.clear_completed()?;
    if ctx.json {
        return print_json(&ClearedJson {
            removed: removed
                .iter()
                .enumerate()
                .map(|(i, t)| task_to_json(i + 1, t))
                .collect(),
        });
    }
    match removed.len() {
        0 => println!("no completed tasks"),
        1 => println!("removed 1 completed task"),
        n => println!("removed {} completed tasks", n),
    }
    Ok(())
}

fn cmd_copy(args: CopyArgs, store: &TaskStore, ctx: &Context) -> CmdResult {
    let tasks = store.list()?;
    let with_due = ctx.config.ui.copy_due_dates && !args.no_due;
    let text = export::copy_text(&tasks, with_due).ok_or("no tasks to copy")?;
    let backend = clipboard::copy_detached(&text)?;
    if let ClipboardBackend::Command(program) = backend {
        tracing::info!(program, "copied via command");
    }
    println!("copied {} tasks to the clipboard", tasks.len());
    Ok(())
}

fn cmd_analyze(args: AnalyzeArgs, ctx: &Context) -> CmdResult {
    let client = AnalysisClient::new(&ctx.config.analysis);
    let result = client
        .analyze(args.kind, &args.input)
        .map_err(|e| e.failure_text())?;
    if ctx.json {
        return print_json(&AnalysisJson {
            analysis: args.kind.endpoint().to_string(),
            result,
        });
    }
    println!("{}", result.trim_end());
    Ok(())
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn cmd_recovery(args: RecoveryCmd, ctx: &Context) -> CmdResult {
    let dir = ctx.data_dir();
    match args.action {
        Some(RecoveryAction::Path) => {
            let path = recovery::recovery_log_path(dir);
            match recovery::recovery_summary(dir) {
                Some(summary) if !ctx.json => {
                    println!("{}  ({} entries)", path.display(), summary.entry_count)
                }
                _ => println!("{}", path.display()),
            }
            Ok(())
        }
        Some(RecoveryAction::Prune(prune)) => {
            let before = prune
                .before
                .as_deref()
                .map(|s| {
                    DateTime::parse_from_rfc3339(s)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
                })
                .transpose()?;
            let removed = recovery::prune_recovery(dir, before, prune.all)?;
            if ctx.json {
                return print_json(&serde_json::json!({ "removed": removed }));
            }
            println!("pruned {} recovery entries", removed);
            Ok(())
        }
        None => {
            let entries = recovery::read_recovery_entries(dir, Some(args.limit.unwrap_or(10)));
            if ctx.json {
                let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                return print_json(&out);
            }
            if entries.is_empty() {
                println!("no recovery entries");
            }
            for entry in &entries {
                print!("{}", format_recovery_entry(entry));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        let mut tasks = vec![
            Task::new("a", None),
            Task::new("b", None),
            Task::new("c", None),
        ];
        tasks[0].id = "1a2b3c4d-0000-4000-8000-000000000001".parse().unwrap();
        tasks[1].id = "1a2bffff-0000-4000-8000-000000000002".parse().unwrap();
        tasks[2].id = "9f000000-0000-4000-8000-000000000003".parse().unwrap();
        tasks
    }

    #[test]
    fn test_resolve_by_position() {
        let tasks = tasks();
        assert_eq!(resolve_task(&tasks, "2"), Ok(tasks[1].id));
        assert!(resolve_task(&tasks, "0").is_err());
        assert!(resolve_task(&tasks, "4").unwrap_err().contains("3 tasks"));
    }

    #[test]
    fn test_resolve_by_id_prefix() {
        let tasks = tasks();
        assert_eq!(resolve_task(&tasks, "1A2B3"), Ok(tasks[0].id));
        assert_eq!(resolve_task(&tasks, "9f00"), Ok(tasks[2].id));
        assert!(resolve_task(&tasks, "1a2b").unwrap_err().contains("more than one"));
        assert!(resolve_task(&tasks, "abcd").unwrap_err().contains("no task"));
        assert!(resolve_task(&tasks, "9f").is_err());
        assert!(resolve_task(&tasks, "milk").is_err());
    }

    #[test]
    fn test_parse_due_arg() {
        assert_eq!(parse_due_arg("2025-06-01"), Ok(NaiveDate::from_ymd_opt(2025, 6, 1)));
        assert!(parse_due_arg("tomorrow").unwrap_err().contains("YYYY-MM-DD"));
    }
}
