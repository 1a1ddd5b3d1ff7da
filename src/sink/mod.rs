//! Task sinks.
//!
//! A [`TaskSink`] accepts create-task requests. Success means the request
//! was dispatched; there is no acknowledgement that the item exists, and no
//! update or lookup primitive.

mod things;

pub use things::{ThingsSink, add_url};

use crate::model::TaskRequest;

/// Errors a task sink can report for a single request.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The request was rejected before dispatch.
    #[error("Invalid task request: {0}")]
    InvalidRequest(String),

    /// The dispatch mechanism failed.
    #[error("Failed to dispatch task: {0}")]
    Dispatch(String),
}

/// Capability to create to-do items.
pub trait TaskSink {
    /// Dispatch one create-task request.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the request is invalid or could not be dispatched.
    fn create_task(&self, request: &TaskRequest) -> Result<(), SinkError>;
}
