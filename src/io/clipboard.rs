use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard available (tried: {tried})")]
    Unavailable { tried: String },
}

/// How the text reached the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardBackend {
    System,
    Command(&'static str),
}

/// Copy commands tried in order when the system clipboard is unavailable.
const FALLBACK_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

/// Where to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    System,
    Commands,
}

/// Put `text` on the system clipboard from a long-running process.
pub fn copy(text: &str) -> Result<ClipboardBackend, ClipboardError> {
    copy_in_order(text, &[Attempt::System, Attempt::Commands])
}

/// Put `text` on the clipboard from a process that exits right after.
///
/// On X11 and Wayland the clipboard is served by its owner, so contents set
/// through arboard vanish when this process exits unless a clipboard manager
/// takes them over. The copy commands fork a holder that outlives us.
pub fn copy_detached(text: &str) -> Result<ClipboardBackend, ClipboardError> {
    copy_in_order(text, detached_order())
}

fn detached_order() -> &'static [Attempt] {
    if cfg!(all(unix, not(target_os = "macos"))) {
        &[Attempt::Commands, Attempt::System]
    } else {
        &[Attempt::System, Attempt::Commands]
    }
}

fn copy_in_order(text: &str, order: &[Attempt]) -> Result<ClipboardBackend, ClipboardError> {
    let mut tried = Vec::new();
    for attempt in order {
        let copied = match attempt {
            Attempt::System => try_system(text, &mut tried),
            Attempt::Commands => try_commands(text, &mut tried),
        };
        if let Some(backend) = copied {
            return Ok(backend);
        }
    }
    Err(ClipboardError::Unavailable {
        tried: tried.join(", "),
    })
}

fn try_system(text: &str, tried: &mut Vec<String>) -> Option<ClipboardBackend> {
    tried.push("system".to_string());
    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string())) {
        Ok(()) => Some(ClipboardBackend::System),
        Err(e) => {
            tracing::warn!(error = %e, "system clipboard unavailable");
            None
        }
    }
}

fn try_commands(text: &str, tried: &mut Vec<String>) -> Option<ClipboardBackend> {
    for (program, args) in FALLBACK_COMMANDS {
        match pipe_to(program, args, text) {
            Ok(()) => return Some(ClipboardBackend::Command(program)),
            Err(e) => {
                tracing::debug!(program, error = %e, "clipboard command failed");
                tried.push(program.to_string());
            }
        }
    }
    None
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("{} exited with {}", program, status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_error() {
        assert!(pipe_to("prio-no-such-clipboard-tool", &[], "x").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_feeds_stdin() {
        // `true` ignores its input and exits 0; `false` exits 1
        assert!(pipe_to("true", &[], "hello").is_ok());
        assert!(pipe_to("false", &[], "hello").is_err());
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_detached_copy_prefers_commands_on_linux() {
        assert_eq!(detached_order(), &[Attempt::Commands, Attempt::System]);
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_detached_copy_prefers_system_on_macos() {
        assert_eq!(detached_order(), &[Attempt::System, Attempt::Commands]);
    }

    #[test]
    fn test_error_lists_attempts() {
        let err = ClipboardError::Unavailable {
            tried: "system, xclip".to_string(),
        };
        assert_eq!(err.to_string(), "no clipboard available (tried: system, xclip)");
    }
}
