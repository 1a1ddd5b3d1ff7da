//! Reset command implementation.

use std::path::Path;

use crate::config::resolve_state_path;
use crate::error::Result;
use crate::sync::Ledger;

/// Clear all sync state. The next sync treats every ticket as new.
///
/// # Errors
///
/// Returns an error if the state file exists but cannot be deleted.
pub fn execute(state_path: Option<&Path>, json: bool) -> Result<()> {
    let state_path = resolve_state_path(state_path)?;
    let mut ledger = Ledger::load(&state_path);
    let cleared = ledger.len();

    ledger.clear_all()?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "cleared": cleared,
            "state_path": state_path.display().to_string(),
        });
        println!("{output}");
    } else {
        println!("Cleared sync state ({cleared} ticket(s))");
    }

    Ok(())
}
