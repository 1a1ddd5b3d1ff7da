//! Configuration management.
//!
//! This module resolves the well-known file locations and loads the
//! configuration file.
//!
//! # Locations
//!
//! - **Config**: `~/.config/thira/config.json` (override: `--config` / `THIRA_CONFIG`)
//! - **State**: `~/.local/state/thira.json` (override: `--state` / `THIRA_STATE`)
//!
//! Paths are resolved once in the command layer and passed down explicitly,
//! so the ledger and reconciler never read the environment themselves.
//!
//! # Precedence
//!
//! For Jira credentials: environment variable > config file. The config file
//! itself must exist; credentials alone in the environment are not enough.

use crate::error::{Error, Result};
use crate::model::{DEFAULT_LIST_ID, When};
use crate::source::DEFAULT_MAX_RESULTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `jira.url`.
pub const ENV_JIRA_URL: &str = "THIRA_JIRA_URL";
/// Environment variable overriding `jira.username`.
pub const ENV_JIRA_USERNAME: &str = "THIRA_JIRA_USERNAME";
/// Environment variable overriding `jira.api_token`.
pub const ENV_JIRA_TOKEN: &str = "THIRA_JIRA_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the API token is presented to Jira.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// `Authorization: Bearer <token>` (Jira Server / Data Center PAT)
    #[default]
    Bearer,
    /// HTTP basic with username and token (Jira Cloud)
    Basic,
}

/// Validated Jira connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraConfig {
    pub url: String,
    pub username: String,
    pub api_token: String,
    pub auth: AuthMethod,
    pub max_results: u32,
    pub timeout_secs: u64,
}

/// Settings for the Things integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingsConfig {
    pub list_id: String,
    pub when: Option<When>,
}

impl Default for ThingsConfig {
    fn default() -> Self {
        Self {
            list_id: DEFAULT_LIST_ID.to_string(),
            when: None,
        }
    }
}

/// Fully validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jira: JiraConfig,
    pub things: ThingsConfig,
}

/// On-disk shape of the config file. Everything is optional here;
/// [`RawConfig::validate`] decides what is required.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub jira: RawJiraConfig,
    #[serde(default)]
    pub things: RawThingsConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawJiraConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
    #[serde(default)]
    pub auth: AuthMethod,
    pub max_results: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawThingsConfig {
    pub list_id: Option<String>,
    pub when: Option<When>,
}

impl RawConfig {
    /// Apply credential overrides from a variable lookup (normally the
    /// process environment). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_JIRA_URL) {
            self.jira.url = Some(url);
        }
        if let Some(username) = get(ENV_JIRA_USERNAME) {
            self.jira.username = Some(username);
        }
        if let Some(token) = get(ENV_JIRA_TOKEN) {
            self.jira.api_token = Some(token);
        }
    }

    /// Check required fields and fill in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing or invalid field.
    pub fn validate(self) -> Result<AppConfig> {
        let url = required(self.jira.url, "jira.url")?;
        let username = required(self.jira.username, "jira.username")?;
        let api_token = required(self.jira.api_token, "jira.api_token")?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "jira.url must start with http:// or https:// (got '{url}')"
            )));
        }

        let max_results = self.jira.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 {
            return Err(Error::Config("jira.max_results must be at least 1".into()));
        }

        let list_id = self
            .things
            .list_id
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LIST_ID.to_string());

        Ok(AppConfig {
            jira: JiraConfig {
                url: url.trim_end_matches('/').to_string(),
                username,
                api_token,
                auth: self.jira.auth,
                max_results,
                timeout_secs: self.jira.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            things: ThingsConfig {
                list_id,
                when: self.things.when,
            },
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("missing required field '{field}'")))
}

/// Home directory, if one can be determined.
fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf())
}

/// Default config file location: `~/.config/thira/config.json`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join("thira").join("config.json"))
}

/// Default ledger location: `~/.local/state/thira.json`.
#[must_use]
pub fn default_state_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".local").join("state").join("thira.json"))
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `explicit_path` (CLI flag or `THIRA_CONFIG`, bound by clap)
/// 2. `~/.config/thira/config.json`
///
/// # Errors
///
/// Returns [`Error::Config`] if no home directory can be determined.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }
    default_config_path()
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Resolve the ledger file path.
///
/// Priority:
/// 1. `explicit_path` (CLI flag or `THIRA_STATE`, bound by clap)
/// 2. `~/.local/state/thira.json`
///
/// # Errors
///
/// Returns [`Error::Config`] if no home directory can be determined.
pub fn resolve_state_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }
    default_state_path()
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Parse config file content without touching the environment.
///
/// # Errors
///
/// Returns [`Error::Config`] if the content is not valid JSON of the expected shape.
pub fn parse_config(content: &str) -> Result<RawConfig> {
    serde_json::from_str(content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Load and validate the configuration at `path`, applying environment overrides.
///
/// # Errors
///
/// Returns [`Error::ConfigNotFound`] if the file does not exist, and
/// [`Error::Config`] if it cannot be read, parsed, or lacks required fields.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let mut raw = parse_config(&content)?;
    raw.apply_overrides(|name| std::env::var(name).ok());
    raw.validate()
}

/// Config file content written by `thira init`.
#[must_use]
pub fn config_template() -> String {
    let template = RawConfig {
        jira: RawJiraConfig {
            url: Some("https://jira.example.com".into()),
            username: Some("you@example.com".into()),
            api_token: Some("<api token>".into()),
            auth: AuthMethod::Bearer,
            max_results: Some(DEFAULT_MAX_RESULTS),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        },
        things: RawThingsConfig {
            list_id: Some(DEFAULT_LIST_ID.into()),
            when: None,
        },
    };
    // Serializing a struct of plain strings and numbers cannot fail.
    serde_json::to_string_pretty(&template).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"{
        "jira": {
            "url": "https://jira.example.com/",
            "username": "ada",
            "api_token": "secret",
            "auth": "basic",
            "max_results": 20
        },
        "things": { "list_id": "LIST", "when": "today" }
    }"#;

    #[test]
    fn test_full_config_validates() {
        let config = parse_config(FULL).unwrap().validate().unwrap();
        assert_eq!(config.jira.url, "https://jira.example.com");
        assert_eq!(config.jira.auth, AuthMethod::Basic);
        assert_eq!(config.jira.max_results, 20);
        assert_eq!(config.jira.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.things.list_id, "LIST");
        assert_eq!(config.things.when, Some(When::Today));
    }

    #[test]
    fn test_defaults_applied() {
        let raw = parse_config(
            r#"{"jira": {"url": "https://j", "username": "u", "api_token": "t"}}"#,
        )
        .unwrap();
        let config = raw.validate().unwrap();
        assert_eq!(config.jira.auth, AuthMethod::Bearer);
        assert_eq!(config.jira.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.things, ThingsConfig::default());
    }

    #[test]
    fn test_missing_required_field() {
        let raw = parse_config(r#"{"jira": {"url": "https://j", "username": "u"}}"#).unwrap();
        let err = raw.validate().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("jira.api_token")));
    }

    #[test]
    fn test_blank_field_is_missing() {
        let raw =
            parse_config(r#"{"jira": {"url": "https://j", "username": " ", "api_token": "t"}}"#)
                .unwrap();
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let raw = parse_config(r#"{"jira": {"url": "jira.local", "username": "u", "api_token": "t"}}"#)
            .unwrap();
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut raw = parse_config(FULL).unwrap();
        raw.apply_overrides(|name| match name {
            ENV_JIRA_TOKEN => Some("from-env".to_string()),
            ENV_JIRA_URL => Some(String::new()),
            _ => None,
        });
        let config = raw.validate().unwrap();
        assert_eq!(config.jira.api_token, "from-env");
        // Empty override is ignored
        assert_eq!(config.jira.url, "https://jira.example.com");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        assert!(matches!(
            load_config(&path),
            Err(Error::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "[jira]\nurl = nope\n").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_template_parses() {
        let raw = parse_config(&config_template()).unwrap();
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_resolve_paths_with_explicit() {
        let explicit = PathBuf::from("/custom/thira.json");
        assert_eq!(resolve_state_path(Some(explicit.as_path())).unwrap(), explicit);
        assert_eq!(resolve_config_path(Some(explicit.as_path())).unwrap(), explicit);
    }

    #[test]
    fn test_default_paths() {
        let state = default_state_path().unwrap();
        assert!(state.ends_with(".local/state/thira.json"));
        let config = default_config_path().unwrap();
        assert!(config.ends_with(".config/thira/config.json"));
    }
}
