//! Dormancy reactivation: a transaction arriving long after the
//! client's last activity, which is exactly the signature of a compromised
//! dormant account being drained.

use crate::types::{RuleResult, RuleType};

use super::scoring::guard;
use super::{Detector, DetectorInput};

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

pub struct DormancyReactivationDetector;

impl Detector for DormancyReactivationDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        if profile.total_txn_count < 2 {
            return guard(rule, "insufficient history to establish a dormancy baseline");
        }

        let config = crate::config::get();
        let threshold_ms = if rule.params.contains_key("dormancyMinutes") {
            rule.param_f64("dormancyMinutes", config.detectors.dormancy_minutes) * MS_PER_MINUTE
        } else {
            rule.param_f64("dormancyDays", config.detectors.dormancy_days) * MS_PER_DAY
        };

        let gap_ms = (input.txn.timestamp - profile.last_updated).max(0) as f64;
        if gap_ms < threshold_ms {
            return guard(rule, "gap since last activity within expected range");
        }

        let deviation_pct = 100.0 * (gap_ms - threshold_ms) / threshold_ms;
        let partial_score = (50.0 * gap_ms / (threshold_ms * 1.5)).min(100.0);
        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: RuleType::DormancyReactivation,
            triggered: true,
            deviation_pct,
            partial_score,
            risk_weight: rule.risk_weight,
            reason: format!("{:.1} hours since last activity", gap_ms / 3_600_000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::detectors::test_support::*;

    fn init() {
        let _ = config::init_with(config::EngineConfig::default());
    }

    #[test]
    fn guards_below_two_prior_transactions() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::DormancyReactivation);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!DormancyReactivationDetector.evaluate(&input).triggered);
    }

    #[test]
    fn triggers_after_long_gap() {
        init();
        let mut profile = fresh_profile("C1");
        profile.total_txn_count = 5;
        profile.last_updated = 1_000_000_000_000;
        let rule = rule(RuleType::DormancyReactivation).with_param("dormancyDays", "30");
        let mut txn = txn("NEFT", 100.0);
        txn.timestamp = profile.last_updated + 40 * 86_400_000; // 40 days later
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        let result = DormancyReactivationDetector.evaluate(&input);
        assert!(result.triggered);
    }

    #[test]
    fn deviation_pct_and_partial_score_are_distinct() {
        init();
        let mut profile = fresh_profile("C1");
        profile.total_txn_count = 5;
        profile.last_updated = 0;
        let rule = rule(RuleType::DormancyReactivation).with_param("dormancyDays", "30");
        let mut txn = txn("NEFT", 100.0);
        txn.timestamp = 31 * 86_400_000; // 31 days later, threshold is 30 days
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        let result = DormancyReactivationDetector.evaluate(&input);
        assert!(result.triggered);
        assert!((result.deviation_pct - 3.333).abs() < 0.01);
        assert!((result.partial_score - 34.444).abs() < 0.01);
    }

    #[test]
    fn dormancy_minutes_param_overrides_days() {
        init();
        let mut profile = fresh_profile("C1");
        profile.total_txn_count = 5;
        profile.last_updated = 1_000_000_000_000;
        let rule = rule(RuleType::DormancyReactivation).with_param("dormancyMinutes", "10");
        let mut txn = txn("NEFT", 100.0);
        txn.timestamp = profile.last_updated + 20 * 60_000; // 20 minutes later
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(DormancyReactivationDetector.evaluate(&input).triggered);
    }
}
