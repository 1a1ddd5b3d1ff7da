//! Persistent sync ledger.
//!
//! The ledger is the set of ticket ids that have been dispatched to the task
//! sink at least once, plus the time of the last successful dispatch. It is
//! stored as a single JSON document:
//!
//! ```json
//! {
//!   "synced_ids": ["OPS-1", "OPS-2"],
//!   "last_sync": "2025-01-20T10:00:00Z"
//! }
//! ```
//!
//! Every mutation rewrites the whole file (see [`atomic_write`]). Storage
//! failures never abort a run: the in-memory set stays authoritative for the
//! rest of the process and the failure is reported to the caller.
//!
//! There is no locking. Two concurrent runs against the same file race on
//! the rewrite and the last writer wins.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::sync::file::{atomic_write, remove_if_exists};
use crate::sync::types::{LedgerError, LedgerResult, LedgerStats};

/// On-disk ledger document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    /// `synced_tickets` is the key older state files used.
    #[serde(default, alias = "synced_tickets")]
    synced_ids: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    last_sync: Option<DateTime<Utc>>,
}

/// Accept RFC 3339 timestamps and zone-less ISO timestamps (read as local
/// time). Anything else reads as "never" rather than failing the document.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

/// Read the ledger file.
///
/// Returns `Ok(None)` if it does not exist. A zero-length or whitespace-only
/// file is an empty ledger.
fn read_document(path: &Path) -> LedgerResult<Option<LedgerDocument>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LedgerError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(Some(LedgerDocument::default()));
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| LedgerError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Read ledger statistics straight from storage.
///
/// This reflects only what has been persisted; uncommitted in-memory state
/// of a live [`Ledger`] is invisible here. Absent storage reads as zero.
/// Unreadable or corrupt storage also reads as zero and logs a warning.
#[must_use]
pub fn read_stats(path: &Path) -> LedgerStats {
    match read_document(path) {
        Ok(Some(doc)) => {
            let ids: BTreeSet<String> = doc.synced_ids.into_iter().collect();
            LedgerStats {
                total_synced: ids.len(),
                last_sync: doc.last_sync,
                ids: ids.into_iter().collect(),
            }
        }
        Ok(None) => LedgerStats::default(),
        Err(e) => {
            warn!(error = %e, "Could not read sync state");
            LedgerStats::default()
        }
    }
}

/// The in-memory ledger bound to its storage path.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    synced: BTreeSet<String>,
    last_sync: Option<DateTime<Utc>>,
    load_warning: Option<String>,
}

impl Ledger {
    /// Load the ledger from `path`.
    ///
    /// - Missing file: empty ledger, and an empty document is written so the
    ///   location exists. Failure to write is logged, not returned.
    /// - Corrupt or unreadable file: empty ledger, with the problem logged
    ///   and kept in [`Ledger::load_warning`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut ledger = Self {
            path: path.into(),
            synced: BTreeSet::new(),
            last_sync: None,
            load_warning: None,
        };

        match read_document(&ledger.path) {
            Ok(Some(doc)) => {
                ledger.synced = doc.synced_ids.into_iter().collect();
                ledger.last_sync = doc.last_sync;
                debug!(
                    path = %ledger.path.display(),
                    count = ledger.synced.len(),
                    "Loaded sync state"
                );
            }
            Ok(None) => {
                debug!(path = %ledger.path.display(), "No sync state yet, creating");
                if let Err(e) = ledger.persist() {
                    warn!(error = %e, "Could not create sync state file");
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not load sync state, starting empty");
                ledger.load_warning = Some(e.to_string());
            }
        }

        ledger
    }

    /// Problem encountered while loading, if storage was corrupt or unreadable.
    #[must_use]
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    /// Whether `id` has been synced.
    #[must_use]
    pub fn is_synced(&self, id: &str) -> bool {
        self.synced.contains(id)
    }

    /// Number of synced ids held in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.synced.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.synced.is_empty()
    }

    /// Synced ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.synced.iter().map(String::as_str)
    }

    /// Time of the last `mark_synced` (in memory).
    #[must_use]
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Record `id` as synced and rewrite storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage could not be written. The id stays
    /// recorded in memory either way.
    pub fn mark_synced(&mut self, id: &str) -> LedgerResult<()> {
        self.synced.insert(id.to_string());
        self.last_sync = Some(Utc::now());
        self.persist()
    }

    /// Forget `id` and rewrite storage. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if storage could not be written. The id stays
    /// removed in memory either way.
    pub fn remove(&mut self, id: &str) -> LedgerResult<bool> {
        let was_present = self.synced.remove(id);
        self.persist()?;
        Ok(was_present)
    }

    /// Read statistics from storage, not from memory. See [`read_stats`].
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        read_stats(&self.path)
    }

    /// Forget everything and delete the storage file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be deleted.
    pub fn clear_all(&mut self) -> LedgerResult<()> {
        self.synced.clear();
        self.last_sync = None;
        remove_if_exists(&self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Rewrite the full snapshot.
    fn persist(&self) -> LedgerResult<()> {
        let doc = LedgerDocument {
            synced_ids: self.synced.iter().cloned().collect(),
            last_sync: self.last_sync,
        };
        let mut content = serde_json::to_string_pretty(&doc)?;
        content.push('\n');

        atomic_write(&self.path, &content).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
