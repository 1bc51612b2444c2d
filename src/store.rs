//! Consolidated result dataset
//!
//! The [`ResultStore`] accumulates one JSON object per stock code in memory
//! and flushes the whole map to disk alongside the checkpoint. On resume the
//! previously flushed dataset is loaded as the baseline, so records for
//! already-processed codes survive without re-fetching.

use crate::checkpoint::atomic_write;
use crate::error::Result;
use crate::types::{Entity, ProcessingRecord, StockCode};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Timestamp format used for the per-record `update_time` field
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// In-memory dataset of per-stock records, flushed whole to a JSON file
///
/// The on-disk layout is a single JSON object mapping stock code to record.
/// Every record carries `code`, `name`, `market`, and `update_time`;
/// successful records additionally carry every fetched field, failed records
/// instead carry a `status` tag (`"failed"` or `"error"`) and the failure
/// message under `error`.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    records: BTreeMap<StockCode, Value>,
}

impl ResultStore {
    /// Create a store persisting to `path`, starting empty
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Load the previously flushed dataset as the resume baseline
    ///
    /// Returns `Ok(true)` when a prior dataset was loaded, `Ok(false)` when
    /// none exists (fresh run).
    pub fn load(&mut self) -> Result<bool> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        self.records = serde_json::from_slice(&bytes)?;
        tracing::info!(
            path = %self.path.display(),
            records = self.records.len(),
            "loaded result baseline"
        );
        Ok(true)
    }

    /// Persist the dataset, atomically replacing any previous file
    pub fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.records)?;
        let size = bytes.len();
        atomic_write(&self.path, &bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            records = self.records.len(),
            bytes = size,
            "dataset flushed"
        );
        Ok(())
    }

    /// Merge one terminal record into the dataset
    ///
    /// Builds the record object from the entity's display metadata and the
    /// executor outcome. The merged shape follows the consolidated dataset
    /// format exactly; fetched fields are flattened in at the top level.
    pub fn merge_record(&mut self, entity: &Entity, record: &ProcessingRecord) {
        let mut object = Map::new();
        object.insert("code".into(), json!(entity.code));
        object.insert("name".into(), json!(entity.name));
        object.insert("market".into(), json!(entity.market));
        object.insert(
            "update_time".into(),
            json!(record.fetched_at.format(TIMESTAMP_FORMAT).to_string()),
        );

        if record.is_success() {
            for (key, value) in &record.fields {
                object.insert(key.clone(), value.clone());
            }
        } else if let (Some(tag), Some(error)) = (record.failure_tag(), &record.error) {
            object.insert("status".into(), json!(tag));
            object.insert("error".into(), json!(error.message));
        }

        self.records.insert(entity.code.clone(), Value::Object(object));
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up one record by code
    pub fn get(&self, code: &StockCode) -> Option<&Value> {
        self.records.get(code)
    }

    /// Whether a record exists for this code
    pub fn contains(&self, code: &StockCode) -> bool {
        self.records.contains_key(code)
    }

    /// The full record map
    pub fn records(&self) -> &BTreeMap<StockCode, Value> {
        &self.records
    }
}
