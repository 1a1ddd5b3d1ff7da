//! Ticket sources.
//!
//! A [`TicketSource`] supplies an ordered, finite list of tickets for a query.
//! The reconciler only depends on this trait; [`JiraClient`] is the concrete
//! implementation used by the CLI.

mod jira;

pub use jira::{JiraClient, permalink};

use crate::model::Ticket;

/// Query used when the caller does not supply one.
pub const DEFAULT_JQL: &str =
    "assignee = currentUser() AND resolution = Unresolved ORDER BY created DESC";

/// Default cap on the number of tickets fetched per run.
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// A ticket query in the source's native language plus a result bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    /// Custom query; `None` selects [`DEFAULT_JQL`].
    pub jql: Option<String>,
    /// Upper bound on returned tickets. Enforced by the source.
    pub max_results: u32,
}

impl TicketQuery {
    /// The built-in "assigned to me, unresolved, newest first" query.
    #[must_use]
    pub const fn assigned_to_me(max_results: u32) -> Self {
        Self {
            jql: None,
            max_results,
        }
    }

    /// A custom query. Blank strings fall back to the default query.
    pub fn custom(jql: impl Into<String>, max_results: u32) -> Self {
        let jql = jql.into();
        Self {
            jql: if jql.trim().is_empty() { None } else { Some(jql) },
            max_results,
        }
    }

    /// The query text that will actually be sent.
    #[must_use]
    pub fn effective_jql(&self) -> &str {
        self.jql.as_deref().unwrap_or(DEFAULT_JQL)
    }
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self::assigned_to_me(DEFAULT_MAX_RESULTS)
    }
}

/// Errors a ticket source can report.
///
/// `Connection` and `Auth` abort a sync run. `Query` is a failure of one
/// search and is treated as "nothing fetched".
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The tracker could not be reached.
    #[error("Failed to connect to {url}: {message}")]
    Connection { url: String, message: String },

    /// The tracker rejected the credentials.
    #[error("Authentication rejected by {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// The search itself failed (bad query, unexpected response).
    #[error("Ticket query failed: {0}")]
    Query(String),
}

impl SourceError {
    /// Whether this error must abort the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Auth { .. })
    }
}

/// Capability to fetch tickets.
pub trait TicketSource {
    /// Fetch tickets matching `query`, in the order the tracker returns them.
    ///
    /// An empty list means no matches.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the tracker is unreachable, rejects the
    /// credentials, or the search fails.
    fn fetch(&self, query: &TicketQuery) -> Result<Vec<Ticket>, SourceError>;
}
