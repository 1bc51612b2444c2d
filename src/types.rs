//! Core types for stock-harvest

use crate::error::{FetchError, FetchErrorKind};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Unique identifier for a stock (fixed-width exchange code, e.g. "600030")
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockCode(pub String);

impl StockCode {
    /// Create a new StockCode
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the inner code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StockCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for StockCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl std::fmt::Display for StockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the universe: a stock code plus its display metadata
///
/// Entities are read-only inputs enumerated by the
/// [`WorklistProvider`](crate::provider::WorklistProvider); the engine never
/// mutates them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Exchange code, unique within the universe
    pub code: StockCode,
    /// Display name
    pub name: String,
    /// Market / listing group (e.g. "sh", "sz", "bj")
    pub market: String,
}

impl Entity {
    /// Create a new entity
    pub fn new(
        code: impl Into<StockCode>,
        name: impl Into<String>,
        market: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            market: market.into(),
        }
    }
}

/// Terminal status of a processing record
///
/// Records are only ever created in a terminal state; there is no persisted
/// `Pending`. An entity either has a record or has not been attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Fetch produced a non-empty field mapping
    Success,
    /// All attempts exhausted without a non-empty result
    Failed,
}

/// Terminal outcome of processing one entity
///
/// Produced by the [`RecordExecutor`](crate::executor::RecordExecutor),
/// exactly one per attempted entity, immutable thereafter.
#[derive(Clone, Debug)]
pub struct ProcessingRecord {
    /// The entity this record belongs to
    pub code: StockCode,
    /// Terminal status
    pub status: RecordStatus,
    /// Fetched field mapping (empty for failed records)
    pub fields: Map<String, Value>,
    /// Number of attempts actually made (1-based; `max_retries` on failure)
    pub attempts: u32,
    /// Last observed failure, present iff status is `Failed`
    pub error: Option<FetchError>,
    /// When the terminal outcome was produced
    pub fetched_at: DateTime<Local>,
}

impl ProcessingRecord {
    /// Create a success record
    pub fn success(code: StockCode, fields: Map<String, Value>, attempts: u32) -> Self {
        Self {
            code,
            status: RecordStatus::Success,
            fields,
            attempts,
            error: None,
            fetched_at: Local::now(),
        }
    }

    /// Create a failed record carrying the last observed failure
    pub fn failed(code: StockCode, error: FetchError, attempts: u32) -> Self {
        Self {
            code,
            status: RecordStatus::Failed,
            fields: Map::new(),
            attempts,
            error: Some(error),
            fetched_at: Local::now(),
        }
    }

    /// Returns true if the record is a success
    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }

    /// Dataset status tag for failed records
    ///
    /// Empty-data exhaustion is reported as `"failed"`, any other terminal
    /// failure as `"error"`, matching the consolidated dataset format.
    pub fn failure_tag(&self) -> Option<&'static str> {
        match &self.error {
            Some(e) if e.kind == FetchErrorKind::Empty => Some("failed"),
            Some(_) => Some("error"),
            None => None,
        }
    }
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every remaining entity reached a terminal state
    Completed,
    /// The cancellation signal was observed; the report is partial
    Interrupted,
}

/// Aggregate statistics over the consolidated dataset
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total records in the dataset (baseline plus this run)
    pub total: usize,
    /// Records with a successful fetch
    pub succeeded: usize,
    /// Records with a terminal failure
    pub failed: usize,
    /// succeeded / total, in [0, 1]; 0 when the dataset is empty
    pub success_rate: f64,
    /// Record count per market
    pub market_distribution: BTreeMap<String, usize>,
    /// Mean number of fetched fields across successful records
    pub avg_fields_per_success: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total: {}", self.total)?;
        writeln!(
            f,
            "succeeded: {} ({:.1}%)",
            self.succeeded,
            self.success_rate * 100.0
        )?;
        writeln!(f, "failed: {}", self.failed)?;
        writeln!(f, "avg fields per success: {:.1}", self.avg_fields_per_success)?;
        write!(f, "markets:")?;
        for (market, count) in &self.market_distribution {
            write!(f, " {market}={count}")?;
        }
        Ok(())
    }
}

/// Result of a harvest run: outcome, statistics, and the consolidated records
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Whether the run completed or was interrupted
    pub outcome: RunOutcome,
    /// Aggregate statistics over `records`
    pub summary: RunSummary,
    /// The consolidated dataset, keyed by stock code
    pub records: BTreeMap<StockCode, Value>,
}
