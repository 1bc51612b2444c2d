//! Error types for stock-harvest
//!
//! Two layers of failure live here:
//! - [`Error`] — crate-level failures (configuration, persistence, universe
//!   enumeration). Only a subset of these can abort a run.
//! - [`FetchError`] — per-attempt failures reported by the
//!   [`DataFetcher`](crate::provider::DataFetcher) collaborator, carrying an
//!   explicit [`FetchErrorKind`] so retry policy never has to grep raw error
//!   text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for stock-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stock-harvest
///
/// Fetch failures never surface here: they degrade to per-entity `Failed`
/// records inside the run. The variants below are the failures that can
/// actually stop (or refuse to start) a batch.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_retries")
        key: Option<String>,
    },

    /// Universe enumeration failed before any entity was processed
    #[error("worklist error: {0}")]
    Worklist(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Classification of a single fetch failure
///
/// The fetch collaborator classifies its own failures at the source instead
/// of the engine inferring the class from free-text messages. Transient kinds
/// get the extended backoff; everything else gets normal pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Request timed out
    Timeout,
    /// Connection could not be established or was dropped
    Connection,
    /// Other network-level failure (DNS, TLS, unreachable)
    Network,
    /// Provider answered but returned no data
    Empty,
    /// Anything else; behaves like a normal (non-transient) error
    Other,
}

impl FetchErrorKind {
    /// Returns true if the failure is likely temporary and worth the
    /// extended backoff (timeout / connection / network)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection | Self::Network)
    }
}

/// A single failed fetch attempt, as reported by the fetch collaborator
#[derive(Clone, Debug, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    /// Failure classification driving retry policy
    pub kind: FetchErrorKind,
    /// Human-readable description, carried into the failed record
    pub message: String,
}

impl FetchError {
    /// Create a fetch error with an explicit kind
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Request timed out
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, message)
    }

    /// Connection failure
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Connection, message)
    }

    /// Network-level failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    /// Provider returned no data
    pub fn empty() -> Self {
        Self::new(FetchErrorKind::Empty, "API returned empty")
    }

    /// Unclassified failure
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Other, message)
    }

    /// Returns true if this failure warrants the extended backoff
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
