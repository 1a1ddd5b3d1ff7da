//! Remove command implementation.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use crate::config::resolve_state_path;
use crate::error::{Error, Result};
use crate::sync::{Ledger, LedgerError};

#[derive(Debug, Default, Serialize)]
struct RemoveOutput<'a> {
    removed: Vec<&'a str>,
    not_found: Vec<&'a str>,
}

/// Remove tickets from sync state so the next sync creates them again.
///
/// Ids that are not in the ledger are reported and otherwise ignored.
///
/// # Errors
///
/// Returns an error if an id is blank, or if the final ledger write failed.
/// A failed write does not stop the remaining ids from being processed.
pub fn execute(ids: &[String], state_path: Option<&Path>, json: bool) -> Result<()> {
    if let Some(blank) = ids.iter().find(|id| id.trim().is_empty()) {
        return Err(Error::InvalidArgument(format!("invalid ticket id {blank:?}")));
    }

    let state_path = resolve_state_path(state_path)?;
    let mut ledger = Ledger::load(&state_path);

    let (output, unsaved) = remove_ids(&mut ledger, ids);

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        for id in &output.removed {
            println!("{} Removed {id} from sync state", "✓".green());
        }
        for id in &output.not_found {
            println!("{}", format!("{id} was not synced").dimmed());
        }
    }

    match unsaved {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Remove every id, continuing past write failures.
///
/// Each write is a full snapshot, so only the outcome of the last write
/// decides whether storage is current. Its error, if any, is returned.
fn remove_ids<'a>(
    ledger: &mut Ledger,
    ids: &'a [String],
) -> (RemoveOutput<'a>, Option<LedgerError>) {
    let mut output = RemoveOutput::default();
    let mut unsaved = None;

    for id in ids {
        let present = ledger.is_synced(id);
        match ledger.remove(id) {
            Ok(_) => unsaved = None,
            Err(e) => {
                warn!(id = %id, error = %e, "Could not save sync state");
                unsaved = Some(e);
            }
        }

        if present {
            output.removed.push(id);
        } else {
            output.not_found.push(id);
        }
    }

    (output, unsaved)
}
