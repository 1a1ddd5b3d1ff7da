//! Task content derived from a ticket.

use crate::model::{TaskRequest, Ticket, When};

/// Tag attached to every task created by thira.
pub const SYNC_TAG: &str = "jira";

/// Maximum description length carried into task notes, in characters.
pub const DESCRIPTION_LIMIT: usize = 500;

const ELLIPSIS: &str = "...";

/// Sink parameters that come from configuration rather than the ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDefaults {
    pub list_id: Option<String>,
    pub when: Option<When>,
}

/// `[<id>] <title>`
#[must_use]
pub fn task_title(ticket: &Ticket) -> String {
    format!("[{}] {}", ticket.id, ticket.title)
}

/// Notes block: id, link, reporter and a truncated description.
#[must_use]
pub fn task_notes(ticket: &Ticket) -> String {
    let mut parts = vec![
        format!("**Ticket** {}", ticket.id),
        format!("**URL** {}", ticket.permalink),
    ];

    if let Some(reporter) = &ticket.reporter {
        parts.push(format!("**Reporter** {reporter}"));
    }

    if let Some(body) = &ticket.body {
        parts.push(format!("\n**Description**\n{}", truncate(body, DESCRIPTION_LIMIT)));
    }

    parts.join("\n")
}

/// Cut `text` to `limit` characters, appending an ellipsis if anything was cut.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Tags for every created task.
#[must_use]
pub fn task_tags() -> Vec<String> {
    vec![SYNC_TAG.to_string()]
}

/// Full create request for a ticket.
#[must_use]
pub fn task_request(ticket: &Ticket, defaults: &TaskDefaults) -> TaskRequest {
    TaskRequest {
        title: task_title(ticket),
        notes: Some(task_notes(ticket)),
        list_id: defaults.list_id.clone(),
        tags: task_tags(),
        due_date: ticket.due,
        when: defaults.when,
    }
}
