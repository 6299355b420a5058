//! Transaction-type anomaly: flags a transaction of a type the
//! client rarely or never uses.

use crate::types::{RuleResult, RuleType};

use super::scoring::guard;
use super::{Detector, DetectorInput};

pub struct TransactionTypeAnomalyDetector;

impl Detector for TransactionTypeAnomalyDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        if profile.total_txn_count == 0 {
            return guard(rule, "insufficient profile history");
        }

        let min_pct = rule.param_f64(
            "minTypeFrequencyPct",
            crate::config::get().detectors.min_type_frequency_pct,
        );
        let freq_pct = profile.type_frequency(&input.txn.txn_type) * 100.0;

        if freq_pct <= 0.0 {
            return RuleResult {
                rule_id: rule.rule_id.clone(),
                rule_name: rule.name.clone(),
                rule_type: RuleType::TransactionTypeAnomaly,
                triggered: true,
                deviation_pct: 100.0,
                partial_score: 100.0,
                risk_weight: rule.risk_weight,
                reason: format!("client has never used transaction type {}", input.txn.txn_type),
            };
        }

        if freq_pct < min_pct {
            let deviation = (min_pct - freq_pct) / min_pct * 100.0;
            return RuleResult {
                rule_id: rule.rule_id.clone(),
                rule_name: rule.name.clone(),
                rule_type: RuleType::TransactionTypeAnomaly,
                triggered: true,
                deviation_pct: deviation,
                partial_score: deviation.clamp(0.0, 100.0),
                risk_weight: rule.risk_weight,
                reason: format!(
                    "transaction type {} used in only {:.2}% of history (below {:.2}%)",
                    input.txn.txn_type, freq_pct, min_pct
                ),
            };
        }

        guard(rule, "transaction type frequency within expected range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::*;

    #[test]
    fn empty_profile_is_a_guard() {
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::TransactionTypeAnomaly);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        let result = TransactionTypeAnomalyDetector.evaluate(&input);
        assert!(!result.triggered);
    }

    #[test]
    fn never_seen_type_scores_maximally() {
        let _ = crate::config::init_with(crate::config::EngineConfig::default());
        let mut profile = fresh_profile("C1");
        profile.total_txn_count = 50;
        profile.type_counts.insert("NEFT".into(), 50);
        let rule = rule(RuleType::TransactionTypeAnomaly);
        let txn = txn("RTGS", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        let result = TransactionTypeAnomalyDetector.evaluate(&input);
        assert!(result.triggered);
        assert_eq!(result.partial_score, 100.0);
    }

    #[test]
    fn frequent_type_is_not_triggered() {
        let _ = crate::config::init_with(crate::config::EngineConfig::default());
        let mut profile = fresh_profile("C1");
        profile.total_txn_count = 100;
        profile.type_counts.insert("NEFT".into(), 90);
        let rule = rule(RuleType::TransactionTypeAnomaly);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        let result = TransactionTypeAnomalyDetector.evaluate(&input);
        assert!(!result.triggered);
    }
}
