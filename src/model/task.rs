//! Task request model for the local to-do application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Things project that receives synced tickets unless configured otherwise.
pub const DEFAULT_LIST_ID: &str = "GXZujchhWvXFy6jsS7bFWS";

/// Scheduling hint understood by the task application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum When {
    Today,
    Tomorrow,
    Evening,
    Anytime,
    Someday,
}

impl When {
    /// Get the string representation used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Evening => "evening",
            Self::Anytime => "anytime",
            Self::Someday => "someday",
        }
    }
}

impl std::fmt::Display for When {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to create one to-do item.
///
/// Every field except `title` is optional. A fresh value is built for each
/// call; nothing here is shared between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRequest {
    pub title: String,
    pub notes: Option<String>,
    pub list_id: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub when: Option<When>,
}

impl TaskRequest {
    /// Create a request with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
