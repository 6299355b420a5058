//! Shared scoring conventions used by most threshold-style detectors:
//! `threshold = baseline·(1+variancePct/100)`, `deviationPct` relative to
//! the allowed range, and the two partial-score
//! mappings detectors pick between.

use crate::types::{AnomalyRule, RuleResult};

pub const EPS: f64 = 1e-9;

pub fn threshold(baseline: f64, variance_pct: f64) -> f64 {
    baseline * (1.0 + variance_pct / 100.0)
}

/// `100 * (observed - threshold) / max(allowedRange, EPS)`, where
/// `allowedRange = baseline * variancePct / 100`.
pub fn deviation_pct(observed: f64, baseline: f64, variance_pct: f64) -> f64 {
    let excess = observed - threshold(baseline, variance_pct);
    let allowed_range = baseline * variance_pct / 100.0;
    100.0 * excess / allowed_range.abs().max(EPS)
}

/// `clamp(50 + deviationPct/2, 50, 100)` — the mapping for detectors whose
/// trigger is itself a soft threshold crossing.
pub fn score_half_plus(deviation_pct: f64) -> f64 {
    (50.0 + deviation_pct / 2.0).clamp(50.0, 100.0)
}

/// `clamp(deviationPct, 0, 100)` — the mapping for detectors whose
/// deviation is already expressed as a 0..100 severity.
pub fn score_clamped(deviation_pct: f64) -> f64 {
    deviation_pct.clamp(0.0, 100.0)
}

/// Outcome of the common "observed exceeds a variance-scaled baseline"
/// check shared by the majority of detectors.
pub struct ThresholdEvaluation {
    pub triggered: bool,
    pub deviation_pct: f64,
    pub partial_score: f64,
}

pub fn evaluate_threshold(observed: f64, baseline: f64, variance_pct: f64) -> ThresholdEvaluation {
    let triggered = observed > threshold(baseline, variance_pct);
    let deviation = deviation_pct(observed, baseline, variance_pct).max(0.0);
    let partial_score = if triggered { score_half_plus(deviation) } else { 0.0 };
    ThresholdEvaluation { triggered, deviation_pct: deviation, partial_score }
}

/// A not-triggered result for a guard condition (insufficient history,
/// missing beneficiary key, ...) — distinct from the registry's own
/// "evaluator error" recovery path but constructed the same way.
pub fn guard(rule: &AnomalyRule, reason: impl Into<String>) -> RuleResult {
    RuleResult::not_triggered(&rule.rule_id, &rule.name, rule.rule_type, rule.risk_weight, reason)
}

/// A triggered result built from a threshold evaluation.
pub fn triggered(rule: &AnomalyRule, eval: ThresholdEvaluation) -> RuleResult {
    if !eval.triggered {
        return guard(rule, "within baseline");
    }
    RuleResult {
        rule_id: rule.rule_id.clone(),
        rule_name: rule.name.clone(),
        rule_type: rule.rule_type,
        triggered: true,
        deviation_pct: eval.deviation_pct,
        partial_score: eval.partial_score,
        risk_weight: rule.risk_weight,
        reason: format!("observed exceeds variance-scaled baseline by {:.1}%", eval.deviation_pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deviation_is_zero_at_threshold() {
        assert!((deviation_pct(110.0, 100.0, 10.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn score_half_plus_floors_at_fifty() {
        assert_eq!(score_half_plus(-100.0), 50.0);
        assert_eq!(score_half_plus(0.0), 50.0);
    }

    #[test]
    fn score_half_plus_caps_at_hundred() {
        assert_eq!(score_half_plus(1000.0), 100.0);
    }

    #[test]
    fn evaluate_threshold_not_triggered_below_baseline() {
        let eval = evaluate_threshold(90.0, 100.0, 10.0);
        assert!(!eval.triggered);
        assert_eq!(eval.partial_score, 0.0);
    }

    #[test]
    fn evaluate_threshold_triggers_above_baseline() {
        let eval = evaluate_threshold(200.0, 100.0, 10.0);
        assert!(eval.triggered);
        assert!(eval.partial_score > 50.0);
    }
}
