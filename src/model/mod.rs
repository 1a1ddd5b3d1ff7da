//! Data models for thira.
//!
//! - Ticket (from the issue tracker)
//! - TaskRequest (to the to-do application)

pub mod task;
pub mod ticket;

pub use task::{DEFAULT_LIST_ID, TaskRequest, When};
pub use ticket::Ticket;
