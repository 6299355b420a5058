//! Shared data model for the transaction risk engine.
//!
//! - `transaction`: the inbound, immutable `Transaction` and its beneficiary
//!   key derivation.
//! - `profile`: `ClientProfile` and its online-statistics building blocks.
//! - `rule`: `AnomalyRule` and the fifteen `RuleType`s.
//! - `evaluation`: `EvaluationResult` / `RuleResult` and the action mapping.
//! - `queue`: `ReviewQueueItem`, feedback status, and the tuner's audit
//!   record.
//! - `forest`: the persisted Isolation Forest model shape.

mod evaluation;
mod forest;
mod profile;
mod queue;
mod rule;
mod transaction;

pub use evaluation::{Action, EvaluationResult, RiskLevel, RuleResult};
pub use forest::{FeatureVector, ForestNode, IsolationForestModel, IsolationTree, FOREST_FEATURE_COUNT};
pub use profile::{BeneficiaryStats, ClientProfile, DailyAggregate, HourlyAggregate, OnlineStat, SeasonalSlot};
pub use queue::{FeedbackStatus, ReviewQueueFilter, ReviewQueueItem, RuleWeightChange, StatusCounts};
pub use rule::{AnomalyRule, RuleType, RISK_WEIGHT_CEILING, RISK_WEIGHT_FLOOR};
pub use transaction::Transaction;

/// UTC hour bucket `YYYYMMDDHH`, bit-for-bit stable across every component
/// that needs it.
pub fn hour_bucket(timestamp_ms: i64) -> String {
    use chrono::{DateTime, Utc};
    let dt = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    dt.format("%Y%m%d%H").to_string()
}

/// UTC day bucket `YYYYMMDD`.
pub fn day_bucket(timestamp_ms: i64) -> String {
    use chrono::{DateTime, Utc};
    let dt = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    dt.format("%Y%m%d").to_string()
}

/// Hour-of-day (0..23), UTC.
pub fn hour_of_day(timestamp_ms: i64) -> usize {
    use chrono::{DateTime, Timelike, Utc};
    let dt = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    dt.hour() as usize
}

/// Day-of-week (0..6, Monday=0), UTC.
pub fn day_of_week(timestamp_ms: i64) -> usize {
    use chrono::{DateTime, Datelike, Utc};
    let dt = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    dt.weekday().num_days_from_monday() as usize
}

/// Hour-of-day (0..23) encoded in a `YYYYMMDDHH` bucket string, used at
/// rollover to attribute the just-completed hour to its seasonal slot
/// without re-deriving it from a stored timestamp.
pub fn hour_of_day_from_bucket(bucket: &str) -> Option<usize> {
    use chrono::NaiveDateTime;
    NaiveDateTime::parse_from_str(bucket, "%Y%m%d%H")
        .ok()
        .map(|dt| dt.format("%H").to_string().parse().unwrap_or(0))
}

/// Day-of-week (0..6, Monday=0) encoded in a `YYYYMMDD` bucket string.
pub fn day_of_week_from_bucket(bucket: &str) -> Option<usize> {
    use chrono::{Datelike, NaiveDate};
    NaiveDate::parse_from_str(bucket, "%Y%m%d")
        .ok()
        .map(|d| d.weekday().num_days_from_monday() as usize)
}
