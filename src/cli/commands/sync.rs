//! Sync command implementation.
//!
//! Loads config, connects to Jira, then runs one reconciliation pass against
//! the ledger. With `--dry-run` the decisions are printed and nothing is sent
//! or recorded.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::cli::SyncArgs;
use crate::config::{AppConfig, load_config, resolve_config_path, resolve_state_path};
use crate::error::{Error, Result};
use crate::sink::ThingsSink;
use crate::source::{JiraClient, TicketQuery};
use crate::sync::{
    Ledger, LedgerStats, PlannedTicket, Reconciler, SyncOptions, SyncRunResult, TaskDefaults,
    format_last_sync, print_plan, print_run_summary,
};

#[derive(Serialize)]
struct SyncOutput<'a> {
    jql: &'a str,
    #[serde(flatten)]
    result: &'a SyncRunResult,
    total_synced: usize,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    dry_run: bool,
    jql: &'a str,
    tickets: &'a [PlannedTicket],
}

/// Execute the sync command.
///
/// # Errors
///
/// Returns an error if the config is missing or invalid, if Jira cannot be
/// reached, or [`Error::SyncIncomplete`] after a run in which some tickets
/// failed (the summary is printed first).
pub fn execute(
    args: &SyncArgs,
    config_path: Option<&Path>,
    state_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(&resolve_config_path(config_path)?)?;
    let state_path = resolve_state_path(state_path)?;

    let query = build_query(args, &config)?;
    let defaults = task_defaults(args, &config);
    let options = SyncOptions {
        force_resync: args.force_resync,
        update_existing: args.update_existing,
    };

    let client = JiraClient::connect(&config.jira)?;
    let sink = ThingsSink::new();
    let mut ledger = Ledger::load(&state_path);

    if !json {
        if let Some(warning) = ledger.load_warning() {
            eprintln!("Warning: {warning}");
        }
        print_previous(&ledger.stats());
    }

    info!(jql = query.effective_jql(), max_results = query.max_results, "Starting sync");

    let mut reconciler = Reconciler::new(&client, &sink, &mut ledger).with_defaults(defaults);

    if args.dry_run {
        let plan = reconciler.plan(&query, options)?;
        if json {
            let output = PlanOutput {
                dry_run: true,
                jql: query.effective_jql(),
                tickets: &plan,
            };
            println!("{}", serde_json::to_string(&output)?);
        } else {
            print_plan(&plan);
        }
        return Ok(());
    }

    let result = reconciler.run(&query, options)?;
    let total_synced = ledger.len();

    if json {
        let output = SyncOutput {
            jql: query.effective_jql(),
            result: &result,
            total_synced,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_run_summary(&result);
        println!();
        println!("Total tickets ever synced: {total_synced}");
    }

    if result.is_clean() {
        Ok(())
    } else {
        Err(Error::SyncIncomplete {
            failed: result.failed,
        })
    }
}

/// Query from flags, falling back to the configured page size.
fn build_query(args: &SyncArgs, config: &AppConfig) -> Result<TicketQuery> {
    let max_results = args.max_results.unwrap_or(config.jira.max_results);
    if max_results == 0 {
        return Err(Error::InvalidArgument(
            "--max-results must be at least 1".to_string(),
        ));
    }

    Ok(match &args.jql {
        Some(jql) => TicketQuery::custom(jql.as_str(), max_results),
        None => TicketQuery::assigned_to_me(max_results),
    })
}

fn task_defaults(args: &SyncArgs, config: &AppConfig) -> TaskDefaults {
    TaskDefaults {
        list_id: Some(
            args.list_id
                .clone()
                .unwrap_or_else(|| config.things.list_id.clone()),
        ),
        when: args.when.or(config.things.when),
    }
}

fn print_previous(stats: &LedgerStats) {
    println!("Previous sync stats:");
    println!("  Total tickets synced: {}", stats.total_synced);
    println!("  Last sync: {}", format_last_sync(stats.last_sync));
    println!();
}
