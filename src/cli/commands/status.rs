//! Status command implementation.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::resolve_state_path;
use crate::error::Result;
use crate::sync::{get_sync_status, print_status};

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput<'a> {
    state_path: String,
    total_synced: usize,
    last_sync: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
}

/// Execute status command.
///
/// Reads the ledger file without creating it.
///
/// # Errors
///
/// Returns an error if the state path cannot be resolved or JSON output fails.
pub fn execute(show_ids: bool, state_path: Option<&Path>, json: bool) -> Result<()> {
    let state_path = resolve_state_path(state_path)?;
    let status = get_sync_status(&state_path);

    if json {
        let output = StatusOutput {
            state_path: state_path.display().to_string(),
            total_synced: status.total_synced,
            last_sync: status.last_sync,
            ids: show_ids.then_some(status.ids.as_slice()),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_status(&status, show_ids);
    }

    Ok(())
}
