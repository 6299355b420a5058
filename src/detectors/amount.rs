//! Amount-based detectors: transaction amount against the
//! client's global baseline, against its current-hour baseline, and
//! against its per-type baseline.

use crate::types::RuleResult;

use super::scoring::{evaluate_threshold, guard, triggered};
use super::{Detector, DetectorInput};

pub struct AmountAnomalyDetector;

impl Detector for AmountAnomalyDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let baseline = input.profile.amount.ewma;
        triggered(rule, evaluate_threshold(input.txn.amount, baseline, rule.variance_pct))
    }
}

pub struct HourlyAmountAnomalyDetector;

impl Detector for HourlyAmountAnomalyDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        if profile.hourly.completed_hours_count < 2 {
            return guard(rule, "fewer than two completed hours of history");
        }

        let baseline = profile.hourly.ewma_amount;
        let observed = input.context.current_hour_amount;
        triggered(rule, evaluate_threshold(observed, baseline, rule.variance_pct))
    }
}

pub struct AmountPerTypeDetector;

impl Detector for AmountPerTypeDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        let min_samples = rule.param_u64("minTypeSamples", crate::config::get().detectors.min_type_samples);
        let Some(stat) = profile.amount_by_type.get(&input.txn.txn_type) else {
            return guard(rule, "no prior samples for this transaction type");
        };
        if stat.count < min_samples {
            return guard(rule, "insufficient samples for this transaction type");
        }

        triggered(rule, evaluate_threshold(input.txn.amount, stat.ewma, rule.variance_pct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::*;
    use crate::types::RuleType;

    #[test]
    fn amount_anomaly_triggers_above_baseline() {
        let mut profile = fresh_profile("C1");
        profile.amount.ewma = 100.0;
        let rule = rule(RuleType::AmountAnomaly);
        let txn = txn("NEFT", 500.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(AmountAnomalyDetector.evaluate(&input).triggered);
    }

    #[test]
    fn hourly_amount_anomaly_guards_below_two_hours() {
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::HourlyAmountAnomaly);
        let txn = txn("NEFT", 500.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!HourlyAmountAnomalyDetector.evaluate(&input).triggered);
    }

    #[test]
    fn amount_per_type_guards_without_prior_samples() {
        let _ = crate::config::init_with(crate::config::EngineConfig::default());
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::AmountPerType);
        let txn = txn("NEFT", 500.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!AmountPerTypeDetector.evaluate(&input).triggered);
    }

    #[test]
    fn amount_per_type_triggers_above_type_baseline() {
        let _ = crate::config::init_with(crate::config::EngineConfig::default());
        let mut profile = fresh_profile("C1");
        let mut stat = crate::types::OnlineStat::default();
        for _ in 0..10 {
            stat.update(100.0, 0.3);
        }
        profile.amount_by_type.insert("NEFT".into(), stat);
        let rule = rule(RuleType::AmountPerType);
        let txn = txn("NEFT", 1000.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(AmountPerTypeDetector.evaluate(&input).triggered);
    }
}
