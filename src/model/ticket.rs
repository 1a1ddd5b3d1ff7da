//! Ticket model.
//!
//! Tickets are produced by a [`TicketSource`](crate::source::TicketSource) and
//! are read-only to the rest of the crate. Optional fields are resolved once
//! at the source boundary, so formatting code never probes for presence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A unit of work fetched from the issue tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker key, unique within the source (e.g. "OPS-123")
    pub id: String,

    /// One-line summary
    pub title: String,

    /// Free-text description
    pub body: Option<String>,

    /// Display name of the reporter
    pub reporter: Option<String>,

    /// Due date, if the tracker has one
    pub due: Option<NaiveDate>,

    /// Browser link back to the ticket
    pub permalink: String,
}

impl Ticket {
    /// Create a ticket with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        permalink: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: None,
            reporter: None,
            due: None,
            permalink: permalink.into(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = Some(reporter.into());
        self
    }

    #[must_use]
    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }
}
