//! One sync pass: fetch, decide, dispatch, record.
//!
//! # Error policy
//!
//! Only a fatal source error (unreachable tracker, rejected credentials)
//! escapes [`Reconciler::run`], and it does so before any sink call or
//! ledger write. Everything else is contained:
//!
//! - a failed search is logged and treated as "nothing fetched"
//! - a failed sink call is recorded in the result and the run moves on
//! - a failed ledger write is logged; the in-memory ledger keeps the id

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::model::Ticket;
use crate::sink::TaskSink;
use crate::source::{TicketQuery, TicketSource};
use crate::sync::format::{TaskDefaults, task_request};
use crate::sync::ledger::Ledger;
use crate::sync::types::{
    PlannedTicket, SyncDecision, SyncError, SyncFailure, SyncOptions, SyncResult, SyncRunResult,
    TicketOutcome,
};

/// Drives a sync run against a source, a sink and a ledger.
///
/// The reconciler borrows the ledger for the duration of the run; the
/// ledger stays the owner of synced state.
pub struct Reconciler<'a, S: ?Sized, K: ?Sized> {
    source: &'a S,
    sink: &'a K,
    ledger: &'a mut Ledger,
    defaults: TaskDefaults,
}

impl<'a, S, K> Reconciler<'a, S, K>
where
    S: TicketSource + ?Sized,
    K: TaskSink + ?Sized,
{
    pub fn new(source: &'a S, sink: &'a K, ledger: &'a mut Ledger) -> Self {
        Self {
            source,
            sink,
            ledger,
            defaults: TaskDefaults::default(),
        }
    }

    /// Set the list and schedule hint used for every created task.
    #[must_use]
    pub fn with_defaults(mut self, defaults: TaskDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Fetch tickets, downgrading non-fatal source errors to an empty list.
    fn fetch(&self, query: &TicketQuery) -> SyncResult<Vec<Ticket>> {
        match self.source.fetch(query) {
            Ok(tickets) => Ok(tickets),
            Err(e) if e.is_fatal() => Err(SyncError::Source(e)),
            Err(e) => {
                warn!(error = %e, "Error fetching tickets, nothing to sync");
                Ok(Vec::new())
            }
        }
    }

    /// Decide for every fetched ticket without dispatching or recording.
    ///
    /// Each planned send counts as synced for later tickets in the same
    /// fetch, matching what [`Reconciler::run`] does when every send succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Source`] if the source is unreachable or rejects
    /// the credentials.
    pub fn plan(&self, query: &TicketQuery, options: SyncOptions) -> SyncResult<Vec<PlannedTicket>> {
        let tickets = self.fetch(query)?;
        let mut pending = BTreeSet::new();

        Ok(tickets
            .into_iter()
            .map(|ticket| {
                let already_synced =
                    self.ledger.is_synced(&ticket.id) || pending.contains(&ticket.id);
                let decision = SyncDecision::decide(already_synced, options);
                if decision.dispatches() {
                    pending.insert(ticket.id.clone());
                }
                PlannedTicket {
                    decision,
                    id: ticket.id,
                    title: ticket.title,
                }
            })
            .collect())
    }

    /// Run one sync pass.
    ///
    /// Tickets are processed in the order the source returned them. Each
    /// decision is taken against the ledger as it stands when the ticket is
    /// reached.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Source`] if the source is unreachable or rejects
    /// the credentials. No sink call or ledger write has happened in that case.
    pub fn run(&mut self, query: &TicketQuery, options: SyncOptions) -> SyncResult<SyncRunResult> {
        let tickets = self.fetch(query)?;

        let mut result = SyncRunResult {
            fetched: tickets.len(),
            ..SyncRunResult::default()
        };

        if tickets.is_empty() {
            info!("No tickets found to sync");
            return Ok(result);
        }
        info!(count = tickets.len(), "Fetched tickets");

        for ticket in &tickets {
            let decision = SyncDecision::decide(self.ledger.is_synced(&ticket.id), options);

            if !decision.dispatches() {
                debug!(id = %ticket.id, "Already synced, skipping");
                result.skipped += 1;
                result.outcomes.push(TicketOutcome {
                    id: ticket.id.clone(),
                    title: ticket.title.clone(),
                    decision,
                    dispatched: false,
                });
                continue;
            }

            let dispatched = self.dispatch(ticket, decision, &mut result);
            result.outcomes.push(TicketOutcome {
                id: ticket.id.clone(),
                title: ticket.title.clone(),
                decision,
                dispatched,
            });
        }

        info!(
            fetched = result.fetched,
            skipped = result.skipped,
            synced = result.synced,
            failed = result.failed,
            "Sync pass complete"
        );
        Ok(result)
    }

    /// Send one ticket to the sink and record the outcome.
    fn dispatch(&mut self, ticket: &Ticket, decision: SyncDecision, result: &mut SyncRunResult) -> bool {
        let request = task_request(ticket, &self.defaults);

        match self.sink.create_task(&request) {
            Ok(()) => {
                info!(id = %ticket.id, action = decision.label(), "Dispatched task");
                if let Err(e) = self.ledger.mark_synced(&ticket.id) {
                    warn!(id = %ticket.id, error = %e, "Could not save sync state");
                }
                result.synced += 1;
                true
            }
            Err(e) => {
                warn!(id = %ticket.id, error = %e, "Failed to sync ticket");
                result.failed += 1;
                result.failures.push(SyncFailure {
                    id: ticket.id.clone(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskRequest, When};
    use crate::sink::SinkError;
    use crate::source::SourceError;
    use crate::sync::format::SYNC_TAG;
    use crate::sync::ledger::read_stats;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    enum Behavior {
        Tickets(Vec<Ticket>),
        Fail(fn() -> SourceError),
    }

    struct FakeSource {
        behavior: Behavior,
        queries: RefCell<Vec<TicketQuery>>,
    }

    impl FakeSource {
        fn with(ids: &[&str]) -> Self {
            let tickets = ids
                .iter()
                .map(|id| Ticket::new(*id, format!("Title {id}"), format!("https://jira/browse/{id}")))
                .collect();
            Self {
                behavior: Behavior::Tickets(tickets),
                queries: RefCell::new(Vec::new()),
            }
        }

        fn failing(make: fn() -> SourceError) -> Self {
            Self {
                behavior: Behavior::Fail(make),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl TicketSource for FakeSource {
        fn fetch(&self, query: &TicketQuery) -> Result<Vec<Ticket>, SourceError> {
            self.queries.borrow_mut().push(query.clone());
            match &self.behavior {
                Behavior::Tickets(tickets) => Ok(tickets.clone()),
                Behavior::Fail(make) => Err(make()),
            }
        }
    }

    #[derive(Default)]
    struct FakeSink {
        fail_titles_containing: HashSet<String>,
        requests: RefCell<Vec<TaskRequest>>,
    }

    impl FakeSink {
        fn failing_for(id: &str) -> Self {
            Self {
                fail_titles_containing: [format!("[{id}]")].into_iter().collect(),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn titles(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.title.clone()).collect()
        }
    }

    impl TaskSink for FakeSink {
        fn create_task(&self, request: &TaskRequest) -> Result<(), SinkError> {
            self.requests.borrow_mut().push(request.clone());
            if self
                .fail_titles_containing
                .iter()
                .any(|needle| request.title.contains(needle.as_str()))
            {
                return Err(SinkError::Dispatch("opener exited with status 1".into()));
            }
            Ok(())
        }
    }

    fn state_path(dir: &TempDir) -> PathBuf {
        dir.path().join("thira.json")
    }

    const DEFAULT: SyncOptions = SyncOptions {
        force_resync: false,
        update_existing: false,
    };

    #[test]
    fn test_first_run_creates_everything() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["A", "B"]);
        let sink = FakeSink::default();

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(result.fetched, 2);
        assert_eq!(result.synced, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(sink.titles(), vec!["[A] Title A", "[B] Title B"]);
        assert!(ledger.is_synced("A") && ledger.is_synced("B"));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["A", "B", "C"]);
        let sink = FakeSink::default();

        Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();
        let second = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(second.fetched, 3);
        assert_eq!(second.synced, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(sink.requests.borrow().len(), 3);
    }

    #[test]
    fn test_idempotent_across_restart() {
        let temp_dir = TempDir::new().unwrap();
        let source = FakeSource::with(&["A", "B"]);
        let sink = FakeSink::default();

        let mut ledger = Ledger::load(state_path(&temp_dir));
        Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();
        drop(ledger);

        let mut reloaded = Ledger::load(state_path(&temp_dir));
        let result = Reconciler::new(&source, &sink, &mut reloaded)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(result.synced, 0);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_sink_failure_is_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let path = state_path(&temp_dir);
        let mut ledger = Ledger::load(&path);
        let source = FakeSource::with(&["T1", "T2", "T3"]);
        let sink = FakeSink::failing_for("T2");

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(result.fetched, 3);
        assert_eq!(result.synced, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].id, "T2");
        assert!(result.failures[0].reason.contains("status 1"));

        assert_eq!(read_stats(&path).ids, vec!["T1".to_string(), "T3".to_string()]);
        assert!(!ledger.is_synced("T2"));
        // T3 was still attempted after T2 failed
        assert_eq!(sink.requests.borrow().len(), 3);
    }

    #[test]
    fn test_failed_ticket_is_retried_next_run() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["T1", "T2"]);

        Reconciler::new(&source, &FakeSink::failing_for("T2"), &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        let sink = FakeSink::default();
        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(result.synced, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(sink.titles(), vec!["[T2] Title T2"]);
    }

    #[test]
    fn test_force_resync_recreates_synced() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        ledger.mark_synced("X").unwrap();
        let source = FakeSource::with(&["X"]);
        let sink = FakeSink::default();

        let options = SyncOptions {
            force_resync: true,
            update_existing: false,
        };
        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), options)
            .unwrap();

        assert_eq!(result.synced, 1);
        assert_eq!(result.outcomes[0].decision, SyncDecision::Create);
        assert_eq!(sink.requests.borrow().len(), 1);
    }

    #[test]
    fn test_update_existing_labels_and_recreates() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        ledger.mark_synced("OLD").unwrap();
        let source = FakeSource::with(&["OLD", "NEW"]);
        let sink = FakeSink::default();

        let options = SyncOptions {
            force_resync: false,
            update_existing: true,
        };
        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), options)
            .unwrap();

        assert_eq!(result.synced, 2);
        assert_eq!(result.updated(), 1);
        assert_eq!(result.outcomes[0].decision, SyncDecision::Update);
        assert_eq!(result.outcomes[1].decision, SyncDecision::Create);
        // An update is a second create request, identical in shape
        assert_eq!(sink.titles(), vec!["[OLD] Title OLD", "[NEW] Title NEW"]);
    }

    #[test]
    fn test_clear_all_then_run_recreates_all() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["A", "B"]);
        let sink = FakeSink::default();

        Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();
        ledger.clear_all().unwrap();
        assert_eq!(ledger.stats().total_synced, 0);

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();
        assert_eq!(result.synced, 2);
        assert_eq!(sink.requests.borrow().len(), 4);
    }

    #[test]
    fn test_empty_fetch_short_circuits() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&[]);
        let sink = FakeSink::default();

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(result, SyncRunResult::default());
    }

    #[test]
    fn test_query_failure_is_zero_results() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::failing(|| SourceError::Query("HTTP 400: bad JQL".into()));
        let sink = FakeSink::default();

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::custom("nonsense ((", 10), DEFAULT)
            .unwrap();

        assert_eq!(result, SyncRunResult::default());
    }

    #[test]
    fn test_connection_failure_aborts_without_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let path = state_path(&temp_dir);
        let mut ledger = Ledger::load(&path);
        ledger.mark_synced("KEEP").unwrap();
        let before = read_stats(&path);

        let source = FakeSource::failing(|| SourceError::Auth {
            url: "https://jira".into(),
            status: 401,
        });
        let sink = FakeSink::default();

        let err = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap_err();

        assert!(matches!(err, SyncError::Source(SourceError::Auth { .. })));
        assert!(sink.requests.borrow().is_empty());
        assert_eq!(read_stats(&path), before);
    }

    #[test]
    fn test_processing_order_follows_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["Z-9", "A-1", "M-5"]);
        let sink = FakeSink::default();

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        let ids: Vec<_> = result.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["Z-9", "A-1", "M-5"]);
        assert_eq!(sink.titles(), vec!["[Z-9] Title Z-9", "[A-1] Title A-1", "[M-5] Title M-5"]);
    }

    #[test]
    fn test_duplicate_in_one_fetch_dispatched_once() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["A", "A"]);
        let sink = FakeSink::default();

        let result = Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(result.synced, 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_requests_carry_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["A"]);
        let sink = FakeSink::default();

        Reconciler::new(&source, &sink, &mut ledger)
            .with_defaults(TaskDefaults {
                list_id: Some("LIST".into()),
                when: Some(When::Someday),
            })
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        let requests = sink.requests.borrow();
        assert_eq!(requests[0].list_id.as_deref(), Some("LIST"));
        assert_eq!(requests[0].when, Some(When::Someday));
        assert_eq!(requests[0].tags, vec![SYNC_TAG.to_string()]);
        assert!(requests[0].notes.as_deref().unwrap().starts_with("**Ticket** A"));
    }

    #[test]
    fn test_due_date_reaches_sink() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let due = chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let source = FakeSource {
            behavior: Behavior::Tickets(vec![
                Ticket::new("D-1", "Due soon", "https://jira/browse/D-1").with_due(due),
                Ticket::new("D-2", "No date", "https://jira/browse/D-2"),
            ]),
            queries: RefCell::new(Vec::new()),
        };
        let sink = FakeSink::default();

        Reconciler::new(&source, &sink, &mut ledger)
            .run(&TicketQuery::default(), DEFAULT)
            .unwrap();

        let requests = sink.requests.borrow();
        assert_eq!(requests[0].due_date, Some(due));
        assert_eq!(requests[1].due_date, None);
    }

    #[test]
    fn test_query_is_passed_through() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&[]);
        let sink = FakeSink::default();

        let query = TicketQuery::custom("project = OPS", 7);
        Reconciler::new(&source, &sink, &mut ledger)
            .run(&query, DEFAULT)
            .unwrap();

        assert_eq!(source.queries.borrow().as_slice(), &[query]);
    }

    #[test]
    fn test_plan_matches_run_for_duplicates() {
        let cases = [
            DEFAULT,
            SyncOptions {
                force_resync: true,
                update_existing: false,
            },
            SyncOptions {
                force_resync: false,
                update_existing: true,
            },
        ];

        for options in cases {
            let temp_dir = TempDir::new().unwrap();
            let mut ledger = Ledger::load(state_path(&temp_dir));
            let source = FakeSource::with(&["A", "A", "B"]);
            let sink = FakeSink::default();

            let planned: Vec<_> = Reconciler::new(&source, &sink, &mut ledger)
                .plan(&TicketQuery::default(), options)
                .unwrap()
                .into_iter()
                .map(|t| t.decision)
                .collect();
            let ran: Vec<_> = Reconciler::new(&source, &sink, &mut ledger)
                .run(&TicketQuery::default(), options)
                .unwrap()
                .outcomes
                .into_iter()
                .map(|o| o.decision)
                .collect();

            assert_eq!(planned, ran, "options: {options:?}");
        }
    }

    #[test]
    fn test_plan_skips_second_occurrence() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(state_path(&temp_dir));
        let source = FakeSource::with(&["A", "A"]);
        let sink = FakeSink::default();

        let plan = Reconciler::new(&source, &sink, &mut ledger)
            .plan(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(plan[0].decision, SyncDecision::Create);
        assert_eq!(plan[1].decision, SyncDecision::Skip);
        assert!(!ledger.is_synced("A"));
    }

    #[test]
    fn test_plan_has_no_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let path = state_path(&temp_dir);
        let mut ledger = Ledger::load(&path);
        ledger.mark_synced("A").unwrap();
        let source = FakeSource::with(&["A", "B"]);
        let sink = FakeSink::default();

        let plan = Reconciler::new(&source, &sink, &mut ledger)
            .plan(&TicketQuery::default(), DEFAULT)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].decision, SyncDecision::Skip);
        assert_eq!(plan[1].decision, SyncDecision::Create);
        assert!(sink.requests.borrow().is_empty());
        assert_eq!(read_stats(&path).ids, vec!["A".to_string()]);
    }
}
