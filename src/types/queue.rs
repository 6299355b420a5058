//! Review queue items and the tuner's audit trail.

use serde::{Deserialize, Serialize};

use super::evaluation::{Action, RiskLevel};

/// Lifecycle state of a [`ReviewQueueItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    Pending,
    TruePositive,
    FalsePositive,
    AutoAccepted,
}

/// A queued ALERT/BLOCK verdict awaiting human review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewQueueItem {
    pub txn_id: String,
    pub client_id: String,
    pub action: Action,
    pub composite_score: f64,
    pub risk_level: RiskLevel,
    pub triggered_rule_ids: Vec<String>,
    pub enqueued_at: i64,
    pub feedback_status: FeedbackStatus,
    pub feedback_at: Option<i64>,
    pub feedback_by: Option<String>,
    pub auto_accept_deadline: i64,
}

impl ReviewQueueItem {
    pub fn new(
        txn_id: impl Into<String>,
        client_id: impl Into<String>,
        action: Action,
        composite_score: f64,
        risk_level: RiskLevel,
        triggered_rule_ids: Vec<String>,
        enqueued_at: i64,
        auto_accept_timeout_ms: i64,
    ) -> Self {
        Self {
            txn_id: txn_id.into(),
            client_id: client_id.into(),
            action,
            composite_score,
            risk_level,
            triggered_rule_ids,
            enqueued_at,
            feedback_status: FeedbackStatus::Pending,
            feedback_at: None,
            feedback_by: None,
            auto_accept_deadline: enqueued_at + auto_accept_timeout_ms,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.feedback_status == FeedbackStatus::Pending
    }
}

/// An append-only audit record of a tuner-driven weight change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleWeightChange {
    pub rule_id: String,
    pub old_weight: f64,
    pub new_weight: f64,
    pub tp_count: u64,
    pub fp_count: u64,
    pub tp_fp_ratio: f64,
    pub adjusted_at: i64,
}

/// Filter criteria for the review queue's paginated query.
#[derive(Debug, Clone, Default)]
pub struct ReviewQueueFilter {
    pub action: Option<Action>,
    pub client_id: Option<String>,
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
    pub rule_id: Option<String>,
    pub limit: usize,
    /// `enqueuedAt` of the last item seen, for descending-order pagination.
    pub before_cursor: Option<i64>,
}

/// `[pending, true_positive, false_positive, auto_accepted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub true_positive: u64,
    pub false_positive: u64,
    pub auto_accepted: u64,
}
