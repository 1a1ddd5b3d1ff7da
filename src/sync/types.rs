//! Sync types: decisions, run results, ledger statistics and errors.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::source::SourceError;

/// Mode flags for one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOptions {
    /// Re-create tasks for every fetched ticket, ignoring the ledger.
    pub force_resync: bool,
    /// Send already-synced tickets to the sink again, labeled "update".
    pub update_existing: bool,
}

/// What to do with one fetched ticket.
///
/// `Update` dispatches exactly the same create request as `Create`. The task
/// application has no update primitive and no lookup by ticket id, so an
/// "update" produces a second task; the variant only changes how the outcome
/// is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDecision {
    Create,
    Skip,
    Update,
}

impl SyncDecision {
    /// Decide for a ticket given whether its id is already in the ledger.
    #[must_use]
    pub const fn decide(already_synced: bool, options: SyncOptions) -> Self {
        if options.force_resync {
            Self::Create
        } else if options.update_existing {
            if already_synced { Self::Update } else { Self::Create }
        } else if already_synced {
            Self::Skip
        } else {
            Self::Create
        }
    }

    /// Whether this decision results in a sink call.
    #[must_use]
    pub const fn dispatches(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    /// Past-tense label for reporting.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Create => "Synced",
            Self::Skip => "Skipped",
            Self::Update => "Updated",
        }
    }
}

impl std::fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Skip => write!(f, "skip"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// A ticket whose sink call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub id: String,
    pub reason: String,
}

/// Per-ticket record of one run, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketOutcome {
    pub id: String,
    pub title: String,
    pub decision: SyncDecision,
    /// Whether the sink accepted the request. Always false for `Skip`.
    pub dispatched: bool,
}

/// Aggregate result of one sync run. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncRunResult {
    /// Tickets returned by the source.
    pub fetched: usize,
    /// Tickets left alone because they were already synced.
    pub skipped: usize,
    /// Tickets successfully dispatched (created or updated).
    pub synced: usize,
    /// Tickets whose sink call failed.
    pub failed: usize,
    pub failures: Vec<SyncFailure>,
    pub outcomes: Vec<TicketOutcome>,
}

impl SyncRunResult {
    /// Successful dispatches labeled as updates.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.dispatched && o.decision == SyncDecision::Update)
            .count()
    }

    /// True if no ticket failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Decision preview for `--dry-run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTicket {
    pub id: String,
    pub title: String,
    pub decision: SyncDecision,
}

/// What the ledger file says, read independently of any in-memory state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub total_synced: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub ids: Vec<String>,
}

/// Ledger storage errors. All of them are recoverable.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// IO error reading or writing the ledger file.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid ledger document.
    #[error("Corrupt ledger file {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    /// Serialization failure while writing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The ticket source is unreachable or rejected the credentials.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
