//! Checkpoint persistence for resumable runs
//!
//! The checkpoint is the durable record of which stock codes have reached a
//! terminal state. It is small (two code sets and a counter), rewritten
//! whole on every flush, and committed with a write-temp-then-rename so a
//! crash mid-write can never leave a file the next load cannot parse.

use crate::error::Result;
use crate::types::{Entity, StockCode};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamp format used in the checkpoint wire format
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// On-disk checkpoint layout
///
/// Field names are part of the wire format; existing checkpoint files from
/// prior runs must keep loading.
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointState {
    processed_codes: BTreeSet<StockCode>,
    failed_codes: BTreeSet<StockCode>,
    total_processed: u64,
    timestamp: String,
}

/// Durable record of per-entity terminal states
///
/// `processed` holds every code with a terminal record, successes and
/// failures alike; `failed` is the subset that ended in failure. Both sets
/// only grow. Marking is idempotent: re-marking a code changes nothing,
/// including the processed counter.
#[derive(Debug)]
pub struct CheckpointManager {
    path: PathBuf,
    processed: BTreeSet<StockCode>,
    failed: BTreeSet<StockCode>,
    total_processed: u64,
}

impl CheckpointManager {
    /// Create a manager persisting to `path`, starting empty
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            processed: BTreeSet::new(),
            failed: BTreeSet::new(),
            total_processed: 0,
        }
    }

    /// Load prior state from disk
    ///
    /// Returns `Ok(true)` when a prior checkpoint was found and loaded,
    /// `Ok(false)` for a fresh run (no file). A file that exists but does
    /// not parse is an error: silently resetting progress would re-fetch
    /// thousands of entities.
    pub fn load(&mut self) -> Result<bool> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let state: CheckpointState = serde_json::from_slice(&bytes)?;

        self.processed = state.processed_codes;
        self.failed = state.failed_codes;
        self.total_processed = state.total_processed;

        tracing::info!(
            path = %self.path.display(),
            processed = self.processed.len(),
            failed = self.failed.len(),
            "loaded checkpoint"
        );
        Ok(true)
    }

    /// Persist the current state, atomically replacing any previous file
    ///
    /// Safe to call at arbitrary points, including on interrupt. The state
    /// is written to a temporary file in the target directory and renamed
    /// over the destination, so a crashed writer leaves the previous
    /// checkpoint intact.
    pub fn save(&self) -> Result<()> {
        let state = CheckpointState {
            processed_codes: self.processed.clone(),
            failed_codes: self.failed.clone(),
            total_processed: self.total_processed,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&state)?;

        atomic_write(&self.path, &bytes)?;

        tracing::debug!(
            path = %self.path.display(),
            processed = self.processed.len(),
            "checkpoint flushed"
        );
        Ok(())
    }

    /// Delete the checkpoint file, returning whether one existed
    pub fn clear(&mut self) -> Result<bool> {
        self.processed.clear();
        self.failed.clear();
        self.total_processed = 0;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether this code already has a terminal record
    pub fn is_processed(&self, code: &StockCode) -> bool {
        self.processed.contains(code)
    }

    /// Whether this code's terminal record is a failure
    pub fn is_failed(&self, code: &StockCode) -> bool {
        self.failed.contains(code)
    }

    /// Mark a code as terminally processed (idempotent)
    pub fn mark_processed(&mut self, code: &StockCode) {
        if self.processed.insert(code.clone()) {
            self.total_processed += 1;
        }
    }

    /// Mark a code as terminally failed (idempotent; implies processed)
    pub fn mark_failed(&mut self, code: &StockCode) {
        self.mark_processed(code);
        self.failed.insert(code.clone());
    }

    /// Number of processed codes
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Number of failed codes
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// How many entities of `universe` still lack a terminal record
    pub fn remaining_count(&self, universe: &[Entity]) -> usize {
        universe
            .iter()
            .filter(|e| !self.processed.contains(&e.code))
            .count()
    }

    /// One-line human-readable progress summary
    pub fn summary(&self) -> String {
        format!(
            "processed {} codes ({} failed), {} total marks",
            self.processed.len(),
            self.failed.len(),
            self.total_processed
        )
    }
}

/// Write `bytes` to `path` via a temp file in the same directory plus rename
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
