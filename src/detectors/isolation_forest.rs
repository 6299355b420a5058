//! Isolation Forest detector: the only detector that
//! relies on offline-trained per-client model state rather than a running
//! statistic, catching multivariate anomalies the univariate detectors
//! miss.

use crate::forest;
use crate::types::{RuleResult, RuleType};

use super::scoring::guard;
use super::{Detector, DetectorInput};

pub struct IsolationForestDetector;

impl Detector for IsolationForestDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;

        let Some(model) = input.forest_model else {
            return guard(rule, "no trained isolation forest model for this client");
        };

        let features = forest::extract_features(input.txn, input.profile, input.context);
        let s = forest::score(model, &features);

        let threshold_pct = rule.param_f64(
            "scoreThresholdPct",
            crate::config::get().forest.score_threshold_pct,
        );
        let threshold = threshold_pct / 100.0;

        if s < threshold {
            return guard(rule, "isolation forest score below threshold");
        }

        let partial_score = (100.0 * (s - threshold) / (1.0 - threshold).max(super::scoring::EPS)).clamp(0.0, 100.0);
        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: RuleType::IsolationForest,
            triggered: true,
            deviation_pct: partial_score,
            partial_score,
            risk_weight: rule.risk_weight,
            reason: format!("isolation forest anomaly score {s:.3} exceeds threshold {threshold:.3}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::detectors::test_support::*;
    use crate::types::FeatureVector;

    fn init() {
        let _ = config::init_with(config::EngineConfig::default());
    }

    fn training_vectors() -> Vec<FeatureVector> {
        (0..60)
            .map(|i| {
                let x = (i as f64) * 0.01;
                [x, x, x, x, x, x, x, x]
            })
            .collect()
    }

    #[test]
    fn guards_without_a_trained_model() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::IsolationForest);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!IsolationForestDetector.evaluate(&input).triggered);
    }

    #[test]
    fn evaluates_against_a_trained_model_without_panicking() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::IsolationForest).with_param("scoreThresholdPct", "0.0");
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let model = forest::train("C1", &training_vectors(), 10, 32);
        let input = DetectorInput::new(&txn, &profile, &rule, &context).with_forest_model(&model);
        let result = IsolationForestDetector.evaluate(&input);
        assert!(result.partial_score >= 0.0);
    }
}
