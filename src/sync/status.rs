//! Sync status display.
//!
//! Status is read straight from the ledger file, so it shows what is known
//! to be persisted rather than what a running process holds in memory.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use crate::sync::ledger::read_stats;
use crate::sync::types::{LedgerStats, PlannedTicket, SyncDecision, SyncRunResult};

/// Get the persisted sync status for the ledger at `path`.
#[must_use]
pub fn get_sync_status(path: &Path) -> LedgerStats {
    read_stats(path)
}

/// Human-readable last sync time, in local time.
#[must_use]
pub fn format_last_sync(last_sync: Option<DateTime<Utc>>) -> String {
    last_sync.map_or_else(
        || "Never".to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Print sync status to stdout.
pub fn print_status(status: &LedgerStats, show_ids: bool) {
    println!("{}", "Sync Status".bold().underline());
    println!();
    println!("  Total tickets synced: {}", status.total_synced);
    println!("  Last sync:            {}", format_last_sync(status.last_sync));

    if show_ids {
        println!();
        if status.ids.is_empty() {
            println!("{}", "No synced tickets.".dimmed());
        } else {
            println!("{}", "Synced Tickets:".blue().bold());
            for id in &status.ids {
                println!("  {id}");
            }
        }
    }
}

/// Print per-ticket lines and the totals of a finished run.
pub fn print_run_summary(result: &SyncRunResult) {
    if result.fetched == 0 {
        println!("{}", "No tickets found to sync.".dimmed());
        return;
    }

    println!("Found {} ticket(s)", result.fetched);
    if result.skipped > 0 {
        println!(
            "{}",
            format!(
                "Skipping {} already synced ticket(s). Use --force-resync to sync them again.",
                result.skipped
            )
            .dimmed()
        );
    }
    println!();

    for outcome in result.outcomes.iter().filter(|o| o.decision.dispatches()) {
        if outcome.dispatched {
            println!(
                "  {} {}: {} - {}",
                "✓".green(),
                outcome.decision.label(),
                outcome.id,
                outcome.title
            );
        } else {
            println!("  {} Failed: {} - {}", "✗".red(), outcome.id, outcome.title);
        }
    }

    println!();
    println!("{}", "Sync Summary".bold().underline());
    println!("  Fetched: {}", result.fetched);
    println!("  Skipped: {}", result.skipped);
    println!("  Synced:  {}", result.synced.to_string().green());
    let updated = result.updated();
    if updated > 0 {
        println!("  Updated: {updated} (sent again as new tasks)");
    }
    if result.failed > 0 {
        println!("  Failed:  {}", result.failed.to_string().red());
        println!();
        println!("{}", "Failures:".red().bold());
        for failure in &result.failures {
            println!("  {}: {}", failure.id, failure.reason);
        }
    } else {
        println!("  Failed:  0");
    }
}

/// Print the decisions of a dry run.
pub fn print_plan(plan: &[PlannedTicket]) {
    if plan.is_empty() {
        println!("{}", "No tickets found to sync.".dimmed());
        return;
    }

    println!("{}", "Dry run: nothing will be created".yellow().bold());
    println!();
    for ticket in plan {
        let action = match ticket.decision {
            SyncDecision::Create => "create".green(),
            SyncDecision::Update => "update".yellow(),
            SyncDecision::Skip => "skip".dimmed(),
        };
        println!("  {action:<8} {} - {}", ticket.id, ticket.title);
    }

    let to_send = plan.iter().filter(|t| t.decision.dispatches()).count();
    println!();
    println!("  {} of {} ticket(s) would be sent", to_send, plan.len());
}
