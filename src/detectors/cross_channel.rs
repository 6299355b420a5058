//! Cross-channel beneficiary amount: the total a client has
//! sent to one beneficiary today, aggregated across every transaction
//! type/channel, against the client's overall daily-amount baseline —
//! catches structuring that splits one large payment across channels.

use crate::types::RuleResult;

use super::scoring::{evaluate_threshold, guard, triggered};
use super::{Detector, DetectorInput};

pub struct CrossChannelBeneficiaryAmountDetector;

impl Detector for CrossChannelBeneficiaryAmountDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        if input.context.beneficiary_key.is_none() {
            return guard(rule, "transaction has no beneficiary");
        }

        let min_days = rule.param_u64(
            "minDaysForDailyCumulative",
            crate::config::get().detectors.min_days_for_daily_cumulative,
        );
        if profile.daily.completed_days_count < min_days {
            return guard(rule, "fewer completed days than required");
        }

        let baseline = profile.daily.ewma_amount;
        let observed = input.context.current_daily_beneficiary_amount;
        triggered(rule, evaluate_threshold(observed, baseline, rule.variance_pct))
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
    fn guards_without_beneficiary() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::CrossChannelBeneficiaryAmount);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!CrossChannelBeneficiaryAmountDetector.evaluate(&input).triggered);
    }

    #[test]
    fn triggers_when_aggregated_beneficiary_amount_exceeds_daily_baseline() {
        init();
        let mut profile = fresh_profile("C1");
        profile.daily.completed_days_count = 10;
        profile.daily.ewma_amount = 1000.0;
        let rule = rule(RuleType::CrossChannelBeneficiaryAmount);
        let txn = bene_txn("NEFT", 100.0, "111");
        let mut context = fresh_context();
        context.beneficiary_key = Some("HDFC0009999:111".into());
        context.current_daily_beneficiary_amount = 9000.0;
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(CrossChannelBeneficiaryAmountDetector.evaluate(&input).triggered);
    }
}
