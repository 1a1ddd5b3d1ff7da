//! Error types for thira.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (3=not_found, 4=validation, 6=sync, 7=config, 8=io)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::source::SourceError;
use crate::sync::{LedgerError, SyncError};

/// Where earlier releases kept their settings.
const LEGACY_CONFIG_HINT: &str = "~/.config/thira.conf";

/// Result type alias for thira operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Not Found (exit 3)
    ConfigNotFound,

    // Validation (exit 4)
    InvalidArgument,
    ConfigExists,

    // Sync (exit 6)
    SourceUnavailable,
    SyncIncomplete,
    LedgerError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigExists => "CONFIG_EXISTS",
            Self::SourceUnavailable => "SOURCE_UNAVAILABLE",
            Self::SyncIncomplete => "SYNC_INCOMPLETE",
            Self::LedgerError => "LEDGER_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigNotFound => 3,
            Self::InvalidArgument | Self::ConfigExists => 4,
            Self::SourceUnavailable | Self::SyncIncomplete | Self::LedgerError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether running the same command again may succeed without changes.
    ///
    /// True for network trouble and for runs where some tickets failed
    /// (they were not recorded and will be retried).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable | Self::SyncIncomplete)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in thira operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file already exists: {}", path.display())]
    ConfigExists { path: PathBuf },

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{failed} ticket(s) failed to sync")]
    SyncIncomplete { failed: usize },

    #[error("Sync state error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Source(e) => Self::Source(e),
        }
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::ConfigExists { .. } => ErrorCode::ConfigExists,
            Self::Source(_) => ErrorCode::SourceUnavailable,
            Self::SyncIncomplete { .. } => ErrorCode::SyncIncomplete,
            Self::Ledger(_) => ErrorCode::LedgerError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigNotFound { path } => Some(format!(
                "Run `thira init` to create {} and fill in your Jira credentials. \
                 An older {LEGACY_CONFIG_HINT} (INI, [jira] section) is not read; \
                 copy its url, username and api_token across.",
                path.display()
            )),

            Self::Config(msg) if msg.contains("missing required field") => Some(
                "Set jira.url, jira.username and jira.api_token in the config file \
                 (or THIRA_JIRA_URL, THIRA_JIRA_USERNAME, THIRA_JIRA_TOKEN)."
                    .to_string(),
            ),

            Self::Source(SourceError::Auth { .. }) => Some(
                "Check jira.api_token. Jira Cloud needs `\"auth\": \"basic\"` with your email as username."
                    .to_string(),
            ),

            Self::Source(SourceError::Connection { .. }) => {
                Some("Check jira.url and your network connection.".to_string())
            }

            Self::ConfigExists { .. } => {
                Some("Use `thira init --force` to overwrite it.".to_string())
            }

            Self::SyncIncomplete { .. } => Some(
                "Failed tickets were not recorded and will be retried on the next run.".to_string(),
            ),

            Self::Config(_)
            | Self::Source(SourceError::Query(_))
            | Self::Ledger(_)
            | Self::InvalidArgument(_)
            | Self::Io(_)
            | Self::Json(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
