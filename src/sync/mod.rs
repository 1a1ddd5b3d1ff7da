//! Sync state and reconciliation.
//!
//! - **Ledger**: durable set of synced ticket ids (JSON, full rewrite per mutation)
//! - **Reconciler**: one pass of fetch → decide → dispatch → record
//! - **Format**: task title, notes and tags derived from a ticket
//! - **Status**: read-only view over the persisted ledger
//!
//! # Example
//!
//! ```ignore
//! use thira::sync::{Ledger, Reconciler, SyncOptions};
//! use thira::source::TicketQuery;
//!
//! let mut ledger = Ledger::load(state_path);
//! let result = Reconciler::new(&jira, &things, &mut ledger)
//!     .run(&TicketQuery::default(), SyncOptions::default())?;
//! println!("{} synced, {} failed", result.synced, result.failed);
//! ```

mod file;
mod format;
mod ledger;
mod reconcile;
mod status;
mod types;

pub use file::{atomic_write, remove_if_exists};
pub use format::{
    DESCRIPTION_LIMIT, SYNC_TAG, TaskDefaults, task_notes, task_request, task_tags, task_title,
    truncate,
};
pub use ledger::{Ledger, read_stats};
pub use reconcile::Reconciler;
pub use status::{format_last_sync, get_sync_status, print_plan, print_run_summary, print_status};
pub use types::{
    LedgerError, LedgerResult, LedgerStats, PlannedTicket, SyncDecision, SyncError, SyncFailure,
    SyncOptions, SyncResult, SyncRunResult, TicketOutcome,
};
