//! Daily-cadence detectors: cumulative amount moved in a day,
//! and the rate of brand-new beneficiaries added in a day.

use crate::types::{RuleResult, RuleType};

use super::scoring::{evaluate_threshold, guard, triggered};
use super::{Detector, DetectorInput};

pub struct DailyCumulativeAmountDetector;

impl Detector for DailyCumulativeAmountDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        let min_days = rule.param_u64(
            "minDaysForDailyCumulative",
            crate::config::get().detectors.min_days_for_daily_cumulative,
        );
        if profile.daily.completed_days_count < min_days {
            return guard(rule, "fewer completed days than required");
        }

        let baseline = profile.daily.ewma_amount;
        let observed = input.context.current_day_amount;
        triggered(rule, evaluate_threshold(observed, baseline, rule.variance_pct))
    }
}

pub struct NewBeneficiaryVelocityDetector;

impl Detector for NewBeneficiaryVelocityDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;
        let config = crate::config::get();

        let observed = input.context.current_day_new_bene_count;
        let max_per_day = rule.param_u64("maxNewBenePerDay", config.detectors.max_new_bene_per_day);

        if observed >= max_per_day as i64 {
            let partial_score = 100.0;
            return RuleResult {
                rule_id: rule.rule_id.clone(),
                rule_name: rule.name.clone(),
                rule_type: RuleType::NewBeneficiaryVelocity,
                triggered: true,
                deviation_pct: 100.0,
                partial_score,
                risk_weight: rule.risk_weight,
                reason: format!("{observed} new beneficiaries today exceeds the hard cap of {max_per_day}"),
            };
        }

        let min_profile_days = rule.param_u64("minProfileDays", config.detectors.min_profile_days);
        if profile.daily.completed_days_for_bene_count < min_profile_days {
            return guard(rule, "insufficient profile days for statistical baseline");
        }

        let baseline = profile.daily.ewma_new_beneficiaries;
        triggered(rule, evaluate_threshold(observed as f64, baseline, rule.variance_pct))
    }
}
