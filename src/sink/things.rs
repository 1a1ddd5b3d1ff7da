//! Things 3 sink via the `things:///` URL scheme.
//!
//! Requests are encoded as `things:///add?...` and handed to the OS URL
//! opener. Things offers no response channel, so a successful launch is all
//! that can be reported.

use tracing::debug;

use super::{SinkError, TaskSink};
use crate::model::TaskRequest;

const BASE_URL: &str = "things:///";

/// Build the `add` URL for a request.
///
/// Parameters are percent-encoded (spaces as `%20`). Empty optional values
/// are omitted; tags are comma-joined into one parameter.
#[must_use]
pub fn add_url(request: &TaskRequest) -> String {
    let mut params: Vec<(&str, String)> = vec![("title", request.title.clone())];

    if let Some(notes) = request.notes.as_deref().filter(|n| !n.is_empty()) {
        params.push(("notes", notes.to_string()));
    }
    if let Some(list_id) = request.list_id.as_deref().filter(|l| !l.is_empty()) {
        params.push(("list-id", list_id.to_string()));
    }
    if !request.tags.is_empty() {
        params.push(("tags", request.tags.join(",")));
    }
    if let Some(due) = request.due_date {
        params.push(("due-date", due.format("%Y-%m-%d").to_string()));
    }
    if let Some(when) = request.when {
        params.push(("when", when.as_str().to_string()));
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{BASE_URL}add?{query}")
}

/// Things 3 task sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThingsSink;

impl ThingsSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TaskSink for ThingsSink {
    fn create_task(&self, request: &TaskRequest) -> Result<(), SinkError> {
        if request.title.trim().is_empty() {
            return Err(SinkError::InvalidRequest("title is empty".into()));
        }

        let url = add_url(request);
        debug!(title = %request.title, len = url.len(), "Dispatching Things URL");

        open::that(&url).map_err(|e| SinkError::Dispatch(e.to_string()))
    }
}
