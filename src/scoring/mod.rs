//! Composite scoring and action mapping: folds the
//! fifteen per-rule results into one `0..100` score and a PASS/ALERT/BLOCK
//! verdict.

use crate::types::{Action, RiskLevel, RuleResult};

/// Weighted average of triggered rules' partial scores, `0` if none
/// triggered, capped at `100`.
pub fn composite_score(results: &[RuleResult]) -> f64 {
    let (weighted_sum, weight_sum) = results
        .iter()
        .filter(|r| r.triggered)
        .fold((0.0, 0.0), |(ws, w), r| (ws + r.partial_score * r.risk_weight, w + r.risk_weight));

    if weight_sum <= 0.0 {
        return 0.0;
    }
    (weighted_sum / weight_sum).min(100.0)
}

/// `score < alertThreshold => PASS`, `< blockThreshold => ALERT`, else
/// `BLOCK`.
pub fn action_for(score: f64, alert_threshold: f64, block_threshold: f64) -> Action {
    if score < alert_threshold {
        Action::Pass
    } else if score < block_threshold {
        Action::Alert
    } else {
        Action::Block
    }
}

/// Convenience bundling [`composite_score`], [`action_for`], and
/// [`RiskLevel::from_score`] against the live config thresholds.
pub fn score(results: &[RuleResult]) -> (f64, RiskLevel, Action) {
    let config = crate::config::get();
    let composite = composite_score(results);
    let risk_level = RiskLevel::from_score(composite);
    let action = action_for(composite, config.scoring.alert_threshold, config.scoring.block_threshold);
    (composite, risk_level, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleType;

    fn result(triggered: bool, partial_score: f64, risk_weight: f64) -> RuleResult {
        RuleResult {
            rule_id: "R1".into(),
            rule_name: "test".into(),
            rule_type: RuleType::AmountAnomaly,
            triggered,
            deviation_pct: 0.0,
            partial_score,
            risk_weight,
            reason: String::new(),
        }
    }

    #[test]
    fn no_triggered_rules_yields_zero() {
        let results = vec![result(false, 0.0, 1.0), result(false, 0.0, 2.0)];
        assert_eq!(composite_score(&results), 0.0);
    }

    #[test]
    fn weighted_average_of_triggered_rules() {
        let results = vec![result(true, 100.0, 1.0), result(true, 50.0, 1.0), result(false, 90.0, 5.0)];
        // (100*1 + 50*1) / (1+1) = 75, the untriggered rule is excluded entirely.
        assert!((composite_score(&results) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_capped_at_one_hundred() {
        let results = vec![result(true, 100.0, 1.0), result(true, 100.0, 1.0)];
        assert_eq!(composite_score(&results), 100.0);
    }

    #[test]
    fn action_mapping_matches_thresholds() {
        assert_eq!(action_for(10.0, 30.0, 70.0), Action::Pass);
        assert_eq!(action_for(30.0, 30.0, 70.0), Action::Alert);
        assert_eq!(action_for(69.99, 30.0, 70.0), Action::Alert);
        assert_eq!(action_for(70.0, 30.0, 70.0), Action::Block);
    }
}
