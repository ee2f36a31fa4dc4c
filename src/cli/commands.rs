use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::analysis::AnalysisKind;
use crate::model::filter::Filter;

#[derive(Parser)]
#[command(name = "prio", about = concat!("prio v", env!("CARGO_PKG_VERSION"), " - a task list that helps you pick what's next"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Task file to use instead of the configured one
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,

    /// Config file to use instead of ~/.config/prio/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks
    List(ListArgs),
    /// Add a task at the end of the list
    Add(AddArgs),
    /// Toggle a task between open and done
    Toggle(TaskArg),
    /// Change a task's text and due date
    Edit(EditArgs),
    /// Delete a task
    Rm(TaskArg),
    /// Move a task to another position
    Mv(MvArgs),
    /// Delete every completed task
    ClearCompleted,
    /// Copy all tasks to the clipboard, one per line
    Copy(CopyArgs),
    /// Send text to an analysis endpoint
    Analyze(AnalyzeArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Which tasks to show (all, active, completed)
    #[arg(long, value_parser = parse_filter)]
    pub filter: Option<Filter>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

/// A task reference: 1-based position or id prefix
#[derive(Args)]
pub struct TaskArg {
    /// Position in the list (1-based) or id prefix
    pub task: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Position in the list (1-based) or id prefix
    pub task: String,
    /// New task text
    pub text: String,
    /// New due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "no_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub no_due: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Position in the list (1-based) or id prefix
    pub task: String,
    /// Target position (1-based; past the end moves to the end)
    pub position: usize,
}

#[derive(Args)]
pub struct CopyArgs {
    /// Leave out due dates
    #[arg(long)]
    pub no_due: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Analysis to run (eisenhower, laborit, yerkes-dodson)
    #[arg(value_parser = parse_kind)]
    pub kind: AnalysisKind,
    /// Text to analyze
    pub input: String,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this RFC 3339 timestamp (default: 30 days ago)
    #[arg(long, conflicts_with = "all")]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}

fn parse_filter(s: &str) -> Result<Filter, String> {
    s.parse()
}

fn parse_kind(s: &str) -> Result<AnalysisKind, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_means_tui() {
        let cli = Cli::try_parse_from(["prio"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["prio", "list", "--json", "--file", "/tmp/t.json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.file, Some(PathBuf::from("/tmp/t.json")));
    }

    #[test]
    fn test_list_filter_parses() {
        let cli = Cli::try_parse_from(["prio", "list", "--filter", "completed"]).unwrap();
        match cli.command {
            Some(Commands::List(args)) => assert_eq!(args.filter, Some(Filter::Completed)),
            _ => panic!("expected list"),
        }
        assert!(Cli::try_parse_from(["prio", "list", "--filter", "someday"]).is_err());
    }

    #[test]
    fn test_edit_due_flags_conflict() {
        assert!(Cli::try_parse_from(["prio", "edit", "1", "x", "--due", "2025-01-01", "--no-due"]).is_err());
    }

    #[test]
    fn test_analyze_kind() {
        let cli = Cli::try_parse_from(["prio", "analyze", "yerkes-dodson", "plan"]).unwrap();
        match cli.command {
            Some(Commands::Analyze(args)) => assert_eq!(args.kind, AnalysisKind::YerkesDodson),
            _ => panic!("expected analyze"),
        }
        assert!(Cli::try_parse_from(["prio", "analyze", "pareto", "x"]).is_err());
    }
}
