use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Env var holding the filter directive (e.g. `debug`, `prio=trace`).
pub const LOG_ENV: &str = "PRIO_LOG";

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join("prio.log")
}

/// Parse a directive; unset or blank means logging stays off.
fn parse_filter(directive: Option<&str>) -> Result<Option<EnvFilter>, String> {
    match directive.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(d) => EnvFilter::try_new(d)
            .map(Some)
            .map_err(|e| format!("invalid {} directive {:?}: {}", LOG_ENV, d, e)),
    }
}

/// Send tracing output to `<dir>/prio.log` when `PRIO_LOG` is set.
///
/// Never logs to the terminal: the TUI owns it. Problems are reported once
/// on stderr and logging is left off.
pub fn init(dir: &Path) -> Option<PathBuf> {
    let directive = std::env::var(LOG_ENV).ok();
    let filter = match parse_filter(directive.as_deref()) {
        Ok(Some(filter)) => filter,
        Ok(None) => return None,
        Err(msg) => {
            eprintln!("warning: {}", msg);
            return None;
        }
    };

    let path = log_path(dir);
    let file = fs::create_dir_all(dir)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
    let file = match file {
        Ok(f) => f,
        Err(e) => {
            eprintln!("warning: could not open {}: {}", path.display(), e);
            return None;
        }
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok();
    installed.then_some(path)
}
