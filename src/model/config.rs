use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::filter::Filter;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Task file; defaults to `$XDG_DATA_HOME/prio/tasks.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `X-CSRFToken` and as the `csrftoken` cookie
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            base_url: default_base_url(),
            csrf_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub default_filter: Filter,
    /// Append ` (due YYYY-MM-DD)` to copied tasks
    #[serde(default = "default_true")]
    pub copy_due_dates: bool,
    /// Palette overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            default_filter: Filter::All,
            copy_due_dates: true,
            colors: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.storage.path.is_none());
        assert_eq!(config.analysis.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.analysis.timeout_secs, 60);
        assert_eq!(config.ui.default_filter, Filter::All);
        assert!(config.ui.copy_due_dates);
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r##"
[storage]
path = "/tmp/tasks.json"

[analysis]
base_url = "https://prio.example.com"
csrf_token = "abc123"
timeout_secs = 5

[ui]
default_filter = "active"
copy_due_dates = false
colors = { highlight = "#FF0000" }
"##,
        )
        .unwrap();
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/tasks.json")));
        assert_eq!(config.analysis.csrf_token.as_deref(), Some("abc123"));
        assert_eq!(config.analysis.timeout_secs, 5);
        assert_eq!(config.ui.default_filter, Filter::Active);
        assert!(!config.ui.copy_due_dates);
        assert_eq!(config.ui.colors["highlight"], "#FF0000");
    }
}
