//! # stock-harvest
//!
//! Resilient batch-ingestion engine for per-stock base information.
//!
//! The crate drives a large, enumerable universe of stock codes through an
//! external data provider while tolerating upstream rate limits, transient
//! failures, and process interruption. Progress is checkpointed to disk so an
//! interrupted run resumes where it left off instead of re-fetching completed
//! entities.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sequential by design** - One in-flight request at a time; pacing, not
//!   parallelism, is how the engine stays under upstream rate limits
//! - **Resumable** - Every terminal per-entity outcome is durable; a crashed
//!   or cancelled run never loses more than one flush interval of progress
//! - **Pluggable collaborators** - Universe enumeration and the raw fetch are
//!   traits supplied by the caller; the engine owns only the failure handling
//!
//! ## Quick Start
//!
//! ```no_run
//! use stock_harvest::{BatchHarvester, HarvestConfig, WorklistProvider, DataFetcher};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(
//! #     worklist: impl WorklistProvider,
//! #     fetcher: impl DataFetcher,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig {
//!     output_path: "./stock_base_info.json".into(),
//!     ..Default::default()
//! };
//!
//! let cancel = CancellationToken::new();
//! let mut harvester = BatchHarvester::new(config)?;
//! let report = harvester.run(&worklist, &fetcher, &cancel).await?;
//!
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Checkpoint persistence for resumable runs
pub mod checkpoint;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Retry-bounded record execution
pub mod executor;
/// Batch orchestration (the main run loop)
pub mod orchestrator;
/// Adaptive request pacing
pub mod pacing;
/// External collaborator traits
pub mod provider;
/// Consolidated result dataset
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use checkpoint::CheckpointManager;
pub use config::HarvestConfig;
pub use error::{Error, FetchError, FetchErrorKind, Result};
pub use executor::RecordExecutor;
pub use orchestrator::BatchHarvester;
pub use pacing::DelayController;
pub use provider::{DataFetcher, WorklistProvider};
pub use store::ResultStore;
pub use types::{
    Entity, ProcessingRecord, RecordStatus, RunOutcome, RunReport, RunSummary, StockCode,
};
