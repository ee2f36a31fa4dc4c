use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Env var that overrides `analysis.csrf_token`
pub const CSRF_ENV: &str = "PRIO_CSRF_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `$<xdg>` if set and non-empty, else `$HOME/<home_rel>`.
fn xdg_dir(xdg: Option<OsString>, home: Option<OsString>, home_rel: &str) -> PathBuf {
    match xdg.filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"))
            .join(home_rel),
    }
}

/// `$XDG_CONFIG_HOME/prio/config.toml`, falling back to `~/.config`.
pub fn config_path() -> PathBuf {
    xdg_dir(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
        ".config",
    )
    .join("prio")
    .join("config.toml")
}

/// `$XDG_DATA_HOME/prio/tasks.json`, falling back to `~/.local/share`.
pub fn default_task_path() -> PathBuf {
    xdg_dir(
        std::env::var_os("XDG_DATA_HOME"),
        std::env::var_os("HOME"),
        ".local/share",
    )
    .join("prio")
    .join("tasks.json")
}

/// Task file to use: `--file` wins, then `storage.path`, then the default.
pub fn resolve_task_path(config: &Config, cli_file: Option<&Path>) -> PathBuf {
    cli_file
        .map(Path::to_path_buf)
        .or_else(|| config.storage.path.clone())
        .unwrap_or_else(default_task_path)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a config file. A missing file is `Ok(None)`.
pub fn read_config_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Load configuration from `explicit` (which must exist) or the default
/// location (which may not), then apply environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match explicit {
        Some(path) => read_config_from(path)?.ok_or_else(|| ConfigError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?,
        None => read_config_from(&config_path())?.unwrap_or_default(),
    };
    Ok(apply_csrf_override(config, std::env::var(CSRF_ENV).ok()))
}

fn apply_csrf_override(mut config: Config, token: Option<String>) -> Config {
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        config.analysis.csrf_token = Some(token);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::Filter;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_dir_prefers_env() {
        assert_eq!(
            xdg_dir(Some("/xdg".into()), Some("/home/me".into()), ".config"),
            PathBuf::from("/xdg")
        );
        assert_eq!(
            xdg_dir(Some("".into()), Some("/home/me".into()), ".config"),
            PathBuf::from("/home/me/.config")
        );
        assert_eq!(
            xdg_dir(None, None, ".local/share"),
            PathBuf::from("/.local/share")
        );
    }

    #[test]
    fn test_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(read_config_from(&tmp.path().join("config.toml")).unwrap().is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[ui\ndefault_filter = ").unwrap();
        let err = read_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_reads_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[ui]\ndefault_filter = \"completed\"\n").unwrap();
        let config = read_config_from(&path).unwrap().unwrap();
        assert_eq!(config.ui.default_filter, Filter::Completed);
    }

    #[test]
    fn test_csrf_override() {
        let mut config = Config::default();
        config.analysis.csrf_token = Some("from-file".into());

        let kept = apply_csrf_override(config.clone(), Some("  ".into()));
        assert_eq!(kept.analysis.csrf_token.as_deref(), Some("from-file"));

        let replaced = apply_csrf_override(config, Some("from-env".into()));
        assert_eq!(replaced.analysis.csrf_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_resolve_task_path_precedence() {
        let mut config = Config::default();
        config.storage.path = Some(PathBuf::from("/cfg/tasks.json"));
        assert_eq!(
            resolve_task_path(&config, Some(Path::new("/cli.json"))),
            PathBuf::from("/cli.json")
        );
        assert_eq!(
            resolve_task_path(&config, None),
            PathBuf::from("/cfg/tasks.json")
        );
        config.storage.path = None;
        assert!(resolve_task_path(&config, None).ends_with("prio/tasks.json"));
    }
}
