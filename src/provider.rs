//! External collaborator traits
//!
//! The engine does not know how to enumerate the universe or how to talk to
//! the upstream provider; both are supplied by the embedding application.
//! Keeping them behind traits keeps the engine deterministic under test: the
//! integration suite drives the whole orchestrator with scripted stubs.

use crate::error::FetchError;
use crate::types::{Entity, StockCode};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Enumerates the full universe of entities for a run
///
/// The returned order is the processing order. Implementations must be
/// deterministic across calls within a run; the engine calls this exactly
/// once per run.
#[async_trait]
pub trait WorklistProvider: Send + Sync {
    /// List every entity in the universe, in processing order
    ///
    /// An error here is fatal to the run (nothing has been processed yet),
    /// reported as [`Error::Worklist`](crate::error::Error::Worklist).
    async fn list_universe(&self) -> Result<Vec<Entity>, String>;
}

/// Performs one raw fetch against the external provider
///
/// The engine imposes no timeout of its own on a single call; an
/// implementation is expected to bound its own I/O. Failures must be
/// classified via [`FetchErrorKind`](crate::error::FetchErrorKind) — the
/// engine never inspects message text to decide retry policy.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Fetch the field mapping for one stock code
    ///
    /// An empty map is a valid "no data" outcome, distinct from failure; the
    /// engine treats it as retryable.
    async fn fetch_record(&self, code: &StockCode) -> Result<Map<String, Value>, FetchError>;
}
