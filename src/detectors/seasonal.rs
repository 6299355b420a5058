//! Seasonal deviation: compares the current hour/day against
//! the matching hour-of-day / day-of-week slot rather than a flat global
//! baseline, so a client's normal Friday-evening spike doesn't fire every
//! week. Falls back to the global baseline while a slot is still warming
//! up, and skips the metric entirely when neither has enough history.

use crate::types::RuleResult;

use super::scoring::{evaluate_threshold, guard, score_clamped, ThresholdEvaluation};
use super::{Detector, DetectorInput};

fn metric(
    observed: f64,
    slot_ewma: f64,
    slot_count: u64,
    global_ewma: Option<f64>,
    variance_pct: f64,
    min_seasonal_samples: u64,
) -> Option<ThresholdEvaluation> {
    let baseline = if slot_count >= min_seasonal_samples {
        slot_ewma
    } else {
        global_ewma?
    };
    Some(evaluate_threshold(observed, baseline, variance_pct))
}

pub struct SeasonalDeviationDetector;

impl Detector for SeasonalDeviationDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;
        let context = input.context;
        let min_samples = rule.param_u64(
            "minSeasonalSamples",
            crate::config::get().detectors.min_seasonal_samples,
        );

        let hourly_tps_global = (profile.hourly.completed_hours_count >= 2).then_some(profile.hourly.ewma_tps);
        let hourly_amount_global =
            (profile.hourly.completed_hours_count >= 2).then_some(profile.hourly.ewma_amount);
        let daily_amount_global = (profile.daily.completed_days_count >= 2).then_some(profile.daily.ewma_amount);

        let evaluations = [
            metric(
                context.current_hour_count as f64,
                context.hour_of_day_slot.ewma_tps,
                context.hour_of_day_slot.count_tps,
                hourly_tps_global,
                rule.variance_pct,
                min_samples,
            ),
            metric(
                context.current_hour_amount,
                context.hour_of_day_slot.ewma_amount,
                context.hour_of_day_slot.count_amount,
                hourly_amount_global,
                rule.variance_pct,
                min_samples,
            ),
            metric(
                context.current_day_amount,
                context.day_of_week_slot.ewma_amount,
                context.day_of_week_slot.count_amount,
                daily_amount_global,
                rule.variance_pct,
                min_samples,
            ),
            metric(
                context.current_day_count as f64,
                context.day_of_week_slot.ewma_tps,
                context.day_of_week_slot.count_tps,
                None,
                rule.variance_pct,
                min_samples,
            ),
        ];

        let available: Vec<ThresholdEvaluation> = evaluations.into_iter().flatten().collect();
        if available.is_empty() {
            return guard(rule, "no seasonal or global baseline available yet");
        }

        let max_deviation = available
            .iter()
            .filter(|e| e.triggered)
            .map(|e| e.deviation_pct)
            .fold(0.0, f64::max);

        if max_deviation <= 0.0 {
            return guard(rule, "within seasonal expectations");
        }

        let partial_score = score_clamped(max_deviation);
        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: rule.rule_type,
            triggered: true,
            deviation_pct: max_deviation,
            partial_score,
            risk_weight: rule.risk_weight,
            reason: format!("at least one seasonal metric deviates by {max_deviation:.1}%"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::detectors::test_support::*;
    use crate::types::RuleType;

    fn init() {
        let _ = config::init_with(config::EngineConfig::default());
    }

    #[test]
    fn guards_without_any_baseline() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::SeasonalDeviation);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!SeasonalDeviationDetector.evaluate(&input).triggered);
    }

    #[test]
    fn triggers_when_hourly_amount_slot_deviates() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::SeasonalDeviation);
        let txn = txn("NEFT", 100.0);
        let mut context = fresh_context();
        context.hour_of_day_slot.ewma_amount = 1000.0;
        context.hour_of_day_slot.count_amount = 50;
        context.current_hour_amount = 5000.0;
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(SeasonalDeviationDetector.evaluate(&input).triggered);
    }
}
