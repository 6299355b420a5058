//! Error taxonomy. Library code returns these typed errors; only
//! the demo binary collapses them with `anyhow`.

use thiserror::Error;

/// Malformed input or an unknown transaction type. No side effects occur
/// before this is raised.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unknown transaction type: {0}")]
    UnknownTxnType(String),
    #[error("negative amount: {0}")]
    NegativeAmount(f64),
}

/// Timeout, unavailability, or corruption in the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("record corrupted: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// A single detector failed internally; recovered locally by the
/// orchestrator, never propagated.
#[derive(Debug, Error)]
#[error("detector {rule_id} failed: {message}")]
pub struct DetectorError {
    pub rule_id: String,
    pub message: String,
}

/// Isolation Forest model missing, malformed, or feature-count mismatched.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no trained model for client {0}")]
    Missing(String),
    #[error("feature count mismatch: model has {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
    #[error("model unreadable: {0}")]
    Unreadable(String),
}

/// The end-to-end evaluation deadline elapsed.
#[derive(Debug, Error)]
#[error("evaluation for txn {0} timed out")]
pub struct TimeoutError(pub String);

/// Fatal at startup: an invalid configuration invariant.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("alertThreshold ({alert}) must be < blockThreshold ({block})")]
    ThresholdOrdering { alert: f64, block: f64 },
    #[error("weightCeiling ({ceiling}) must be > weightFloor ({floor})")]
    WeightBounds { floor: f64, ceiling: f64 },
    #[error("ewmaAlpha must be in (0,1], got {0}")]
    InvalidAlpha(f64),
}

/// Umbrella error returned by `Engine::evaluate`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
