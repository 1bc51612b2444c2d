//! Retry-bounded record execution
//!
//! [`RecordExecutor`] wraps one logical fetch in a bounded retry loop and is
//! the only component that blocks on failure backoff. Transient network
//! failures get an extended, attempt-scaled wait; every other failure waits
//! out the pacing controller's normal delay before the next attempt.

use crate::error::FetchError;
use crate::pacing::DelayController;
use crate::provider::DataFetcher;
use crate::types::{Entity, ProcessingRecord};
use std::time::Duration;

/// Seconds per attempt index for the extended transient-failure wait
const TRANSIENT_WAIT_STEP_SECS: u64 = 2;

/// Executes one entity's fetch with bounded retries
#[derive(Clone, Copy, Debug)]
pub struct RecordExecutor {
    max_retries: u32,
}

impl RecordExecutor {
    /// Create an executor allowing up to `max_retries` attempts per entity
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Fetch one entity's record, retrying up to the configured bound
    ///
    /// Always returns a terminal [`ProcessingRecord`]; fetch failures never
    /// escape this method. Per attempt:
    ///
    /// - a non-empty result is a success (`attempts` = attempts made so far)
    /// - an empty result counts as a retryable "API returned empty" error
    /// - a transient failure (timeout/connection/network) waits
    ///   `2 × attempt_number` seconds before the next attempt, bypassing the
    ///   pacing controller's computed delay
    /// - any other failure waits out the pacing controller's normal delay
    ///
    /// The pacing controller is informed of every outcome either way.
    pub async fn execute(
        &self,
        entity: &Entity,
        fetcher: &dyn DataFetcher,
        pacer: &mut DelayController,
    ) -> ProcessingRecord {
        let mut last_error = FetchError::empty();

        for attempt in 1..=self.max_retries {
            match fetcher.fetch_record(&entity.code).await {
                Ok(fields) if !fields.is_empty() => {
                    pacer.record_success();
                    if attempt > 1 {
                        tracing::info!(
                            code = %entity.code,
                            attempts = attempt,
                            "fetch succeeded after retry"
                        );
                    }
                    return ProcessingRecord::success(entity.code.clone(), fields, attempt);
                }
                Ok(_) => {
                    last_error = FetchError::empty();
                    pacer.record_error();
                    tracing::warn!(
                        code = %entity.code,
                        attempt,
                        max_retries = self.max_retries,
                        "provider returned no data"
                    );
                    if attempt < self.max_retries {
                        tokio::time::sleep(pacer.next_delay()).await;
                    }
                }
                Err(e) => {
                    pacer.record_error();
                    let wait = if e.is_transient() {
                        // attempt-scaled wait, independent of normal pacing
                        Duration::from_secs(TRANSIENT_WAIT_STEP_SECS * u64::from(attempt))
                    } else {
                        pacer.next_delay()
                    };
                    tracing::warn!(
                        code = %entity.code,
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        kind = ?e.kind,
                        wait_ms = wait.as_millis(),
                        "fetch attempt failed"
                    );
                    last_error = e;
                    if attempt < self.max_retries {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        tracing::error!(
            code = %entity.code,
            attempts = self.max_retries,
            error = %last_error,
            "fetch failed after all retry attempts exhausted"
        );
        ProcessingRecord::failed(entity.code.clone(), last_error, self.max_retries)
    }
}
