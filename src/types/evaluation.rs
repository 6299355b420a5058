//! Evaluation outputs: per-rule results and the composite verdict.

use serde::{Deserialize, Serialize};

use super::rule::RuleType;

/// Verdict bucket derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// `<30 LOW, <60 MEDIUM, <80 HIGH, else CRITICAL`.
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskLevel::Low
        } else if score < 60.0 {
            RiskLevel::Medium
        } else if score < 80.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

/// The action the engine takes on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Pass,
    Alert,
    Block,
}

/// A single detector's verdict on one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleResult {
    pub rule_id: String,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub triggered: bool,
    pub deviation_pct: f64,
    /// `0..100`.
    pub partial_score: f64,
    /// Snapshot of the rule's weight at evaluation time.
    pub risk_weight: f64,
    pub reason: String,
}

impl RuleResult {
    /// A not-triggered result with the given reason — used both for
    /// legitimate guard conditions and for the "evaluator error" recovery
    /// path.
    pub fn not_triggered(
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        rule_type: RuleType,
        risk_weight: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_name: rule_name.into(),
            rule_type,
            triggered: false,
            deviation_pct: 0.0,
            partial_score: 0.0,
            risk_weight,
            reason: reason.into(),
        }
    }
}

/// The engine's immutable verdict for one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub txn_id: String,
    pub client_id: String,
    /// `0..100`.
    pub composite_score: f64,
    pub risk_level: RiskLevel,
    pub action: Action,
    pub rule_results: Vec<RuleResult>,
    pub evaluated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_boundaries() {
        assert_eq!(RiskLevel::from_score(29.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59.99), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(79.99), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
    }
}
