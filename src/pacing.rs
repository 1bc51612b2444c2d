//! Adaptive request pacing
//!
//! The [`DelayController`] owns the delay applied before each upstream
//! request. It widens the gap after consecutive errors, decays back toward
//! the configured baseline after successes, and jitters every computed delay
//! so the request cadence is never a fixed, guessable interval.
//!
//! Pacing state is in-memory only. A resumed run starts again from the
//! configured base delay; only checkpoint/dataset state survives a restart.

use crate::config::HarvestConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Multiplicative jitter bounds applied to every computed delay
const JITTER_RANGE: (f64, f64) = (0.7, 1.3);

/// Growth factor applied after repeated errors, and the burst penalty
const BACKOFF_FACTOR: f64 = 1.5;

/// Decay factor applied toward the base delay after a success
const DECAY_FACTOR: f64 = 0.95;

/// Consecutive errors tolerated before the delay starts growing
const ERROR_THRESHOLD: u32 = 2;

/// Number of recent request timestamps retained for burst detection
const TIMESTAMP_WINDOW: usize = 10;

/// If the 3 most recent requests span less than this, dampen the next delay
const BURST_SPAN: Duration = Duration::from_secs(2);

/// Adaptive delay controller
///
/// The random source is injected and seedable so tests can pin the jitter;
/// production code uses [`DelayController::new`], which seeds from entropy.
#[derive(Debug)]
pub struct DelayController {
    base: f64,
    floor: f64,
    max: f64,
    current: f64,
    consecutive_errors: u32,
    recent_requests: VecDeque<Instant>,
    rng: StdRng,
}

impl DelayController {
    /// Create a controller from the run configuration, seeded from entropy
    pub fn new(config: &HarvestConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a controller with an injected random source (deterministic tests)
    pub fn with_rng(config: &HarvestConfig, rng: StdRng) -> Self {
        Self {
            base: config.base_delay_secs,
            floor: config.floor_delay_secs,
            max: config.max_delay_secs,
            current: config.base_delay_secs,
            consecutive_errors: 0,
            recent_requests: VecDeque::with_capacity(TIMESTAMP_WINDOW),
            rng,
        }
    }

    /// Compute the pacing delay to apply before the next request
    ///
    /// Returns `current × jitter`, with jitter uniform in `[0.7, 1.3]`,
    /// multiplied by 1.5 when the 3 most recent requests arrived within a
    /// 2-second span, and always clamped to `[floor, max]`.
    pub fn next_delay(&mut self) -> Duration {
        let jitter: f64 = self.rng.gen_range(JITTER_RANGE.0..=JITTER_RANGE.1);
        let mut secs = self.current * jitter;

        if self.is_bursting() {
            secs *= BACKOFF_FACTOR;
        }

        // max-then-min rather than f64::clamp: never panics, even for a
        // controller built from an unvalidated config with floor > max
        Duration::from_secs_f64(secs.max(self.floor).min(self.max))
    }

    /// Record a successful request
    ///
    /// Resets the error streak, decays the delay toward (never below) the
    /// base, and appends the current time to the request window.
    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.current = (self.current * DECAY_FACTOR).max(self.base);

        self.recent_requests.push_back(Instant::now());
        while self.recent_requests.len() > TIMESTAMP_WINDOW {
            self.recent_requests.pop_front();
        }
    }

    /// Record a failed request
    ///
    /// Once two or more errors occur in a row, the delay grows by 1.5x per
    /// error, capped at the configured maximum.
    pub fn record_error(&mut self) {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= ERROR_THRESHOLD {
            self.current = (self.current * BACKOFF_FACTOR).min(self.max);
        }
    }

    /// Current un-jittered delay in seconds
    pub fn current_delay_secs(&self) -> f64 {
        self.current
    }

    /// Length of the current error streak
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// True when the 3 most recent recorded requests span less than 2 seconds
    fn is_bursting(&self) -> bool {
        let len = self.recent_requests.len();
        if len < 3 {
            return false;
        }
        let newest = self.recent_requests[len - 1];
        let third_newest = self.recent_requests[len - 3];
        newest.duration_since(third_newest) < BURST_SPAN
    }
}
