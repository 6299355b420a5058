//! Transactions-per-hour spike: flags a client's current-hour
//! transaction count exceeding its variance-scaled hourly baseline.

use crate::types::RuleResult;

use super::scoring::{evaluate_threshold, guard, triggered};
use super::{Detector, DetectorInput};

pub struct TpsSpikeDetector;

impl Detector for TpsSpikeDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        if profile.hourly.completed_hours_count < 2 {
            return guard(rule, "fewer than two completed hours of history");
        }

        let observed = input.context.current_hour_count as f64;
        let baseline = profile.hourly.ewma_tps;
        triggered(rule, evaluate_threshold(observed, baseline, rule.variance_pct))
    }
}
