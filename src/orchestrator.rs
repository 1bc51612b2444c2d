//! Batch orchestration (the main run loop)
//!
//! [`BatchHarvester`] drives the whole run: enumerate the universe, subtract
//! already-processed codes, execute each remaining entity through the
//! retry-bounded executor, merge outcomes into the dataset, and flush
//! checkpoint plus dataset every `batch_size` entities and unconditionally on
//! completion or interruption.
//!
//! Fetches are strictly sequential. Cancellation is observed only at entity
//! boundaries, so an in-flight retry loop always runs to its terminal record
//! before the signal takes effect.

use crate::checkpoint::CheckpointManager;
use crate::config::HarvestConfig;
use crate::error::{Error, Result};
use crate::executor::RecordExecutor;
use crate::pacing::DelayController;
use crate::provider::{DataFetcher, WorklistProvider};
use crate::store::ResultStore;
use crate::types::{Entity, RunOutcome, RunReport, RunSummary, StockCode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Keys every dataset record carries besides the fetched fields
const BASE_RECORD_KEYS: usize = 4; // code, name, market, update_time

/// Drives one resumable batch run end to end
pub struct BatchHarvester {
    config: HarvestConfig,
    pacer: DelayController,
    executor: RecordExecutor,
    checkpoint: CheckpointManager,
    store: ResultStore,
}

impl BatchHarvester {
    /// Create a harvester from a validated configuration
    ///
    /// Pacing starts from the configured base delay; pacing state is never
    /// carried across runs.
    pub fn new(config: HarvestConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a harvester with an injected pacing random source
    ///
    /// Lets tests pin the jitter; behavior is otherwise identical to
    /// [`BatchHarvester::new`].
    pub fn with_rng(config: HarvestConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pacer: DelayController::with_rng(&config, rng),
            executor: RecordExecutor::new(config.max_retries),
            checkpoint: CheckpointManager::new(&config.checkpoint_path),
            store: ResultStore::new(&config.output_path),
            config,
        })
    }

    /// Run the batch to completion or until `cancel` is observed
    ///
    /// Returns the consolidated dataset and summary statistics. The only
    /// fatal errors are universe enumeration failure and a checkpoint that
    /// exists but cannot be parsed; per-entity fetch failures degrade to
    /// `Failed` records and flush failures are logged and retried on the
    /// next flush.
    pub async fn run(
        &mut self,
        worklist: &dyn WorklistProvider,
        fetcher: &dyn DataFetcher,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let universe = worklist.list_universe().await.map_err(Error::Worklist)?;
        let universe = apply_test_subset(universe, self.config.test_subset);
        let total = universe.len();

        let resumed = self.checkpoint.load()?;
        if resumed {
            // completed codes keep their data without re-fetching
            self.store.load()?;
            tracing::info!(
                total,
                remaining = self.checkpoint.remaining_count(&universe),
                checkpoint = %self.checkpoint.summary(),
                "resuming from checkpoint"
            );
        } else {
            tracing::info!(total, "starting fresh run");
        }

        let mut outcome = RunOutcome::Completed;
        let mut remaining = self.checkpoint.remaining_count(&universe);
        let mut since_flush = 0usize;
        let mut run_succeeded = 0usize;
        let mut run_failed = 0usize;

        for (index, entity) in universe.iter().enumerate() {
            // cancellation granularity is the entity, never an in-flight retry
            if cancel.is_cancelled() {
                tracing::warn!(
                    processed_this_run = run_succeeded + run_failed,
                    "cancellation observed, stopping"
                );
                outcome = RunOutcome::Interrupted;
                break;
            }

            // double-check against the checkpoint so re-entrant worklists
            // can never re-fetch a terminal code
            if self.checkpoint.is_processed(&entity.code) {
                continue;
            }

            tracing::info!(
                progress = format!("{}/{}", index + 1, total),
                code = %entity.code,
                name = %entity.name,
                market = %entity.market,
                "processing"
            );

            let record = self.executor.execute(entity, fetcher, &mut self.pacer).await;
            if record.is_success() {
                run_succeeded += 1;
                self.checkpoint.mark_processed(&entity.code);
            } else {
                run_failed += 1;
                self.checkpoint.mark_failed(&entity.code);
            }
            self.store.merge_record(entity, &record);
            remaining = remaining.saturating_sub(1);

            since_flush += 1;
            if since_flush >= self.config.batch_size {
                self.flush();
                since_flush = 0;
                tracing::info!(
                    progress = format!("{}/{}", index + 1, total),
                    succeeded = run_succeeded,
                    failed = run_failed,
                    "batch flushed"
                );
            }

            // pace only ahead of a real fetch; trailing already-processed
            // entries must not cost a final wasted delay
            if remaining > 0 {
                tokio::time::sleep(self.pacer.next_delay()).await;
            }
        }

        // unconditional flush on completion and interruption alike
        self.flush();

        let summary = summarize(self.store.records());
        tracing::info!(
            outcome = ?outcome,
            succeeded_this_run = run_succeeded,
            failed_this_run = run_failed,
            total_records = summary.total,
            "run finished"
        );

        Ok(RunReport {
            outcome,
            summary,
            records: self.store.records().clone(),
        })
    }

    /// Checkpoint state accessor (useful for progress inspection)
    pub fn checkpoint(&self) -> &CheckpointManager {
        &self.checkpoint
    }

    /// Delete the checkpoint file so the next run starts fresh
    pub fn clear_checkpoint(&mut self) -> Result<bool> {
        self.checkpoint.clear()
    }

    /// Flush checkpoint and dataset, tolerating persistence failures
    ///
    /// A failed write risks losing up to one flush interval of progress on a
    /// crash, but never aborts the in-memory run; the next flush retries.
    fn flush(&mut self) {
        if let Err(e) = self.checkpoint.save() {
            tracing::warn!(error = %e, "checkpoint flush failed, will retry on next flush");
        }
        if let Err(e) = self.store.save() {
            tracing::warn!(error = %e, "dataset flush failed, will retry on next flush");
        }
    }
}

/// Truncate the universe to the first N plus last N entries for smoke runs
fn apply_test_subset(universe: Vec<Entity>, subset: Option<usize>) -> Vec<Entity> {
    let Some(n) = subset else {
        return universe;
    };
    if n * 2 >= universe.len() {
        return universe;
    }
    let tail_start = universe.len() - n;
    let mut selected: Vec<Entity> = universe[..n].to_vec();
    selected.extend_from_slice(&universe[tail_start..]);
    selected
}

/// Compute aggregate statistics over the consolidated dataset
fn summarize(records: &BTreeMap<StockCode, Value>) -> RunSummary {
    let total = records.len();
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut fields_over_successes = 0usize;
    let mut market_distribution: BTreeMap<String, usize> = BTreeMap::new();

    for value in records.values() {
        let market = value
            .get("market")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        *market_distribution.entry(market.to_string()).or_insert(0) += 1;

        if value.get("status").is_some() {
            failed += 1;
        } else {
            succeeded += 1;
            let keys = value.as_object().map(|o| o.len()).unwrap_or(0);
            fields_over_successes += keys.saturating_sub(BASE_RECORD_KEYS);
        }
    }

    RunSummary {
        total,
        succeeded,
        failed,
        success_rate: if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64
        },
        market_distribution,
        avg_fields_per_success: if succeeded == 0 {
            0.0
        } else {
            fields_over_successes as f64 / succeeded as f64
        },
    }
}
