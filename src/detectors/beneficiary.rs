//! Beneficiary-focused detectors: rapid repeat payments to the
//! same beneficiary, beneficiary concentration relative to a uniform
//! spread, and suspiciously exact amount repetition to one beneficiary.

use crate::types::{RuleResult, RuleType};

use super::scoring::guard;
use super::{Detector, DetectorInput};

pub struct BeneficiaryRapidRepeatDetector;

impl Detector for BeneficiaryRapidRepeatDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        if input.context.beneficiary_key.is_none() {
            return guard(rule, "transaction has no beneficiary");
        }

        let min_repeat = rule.param_u64(
            "minRepeatCount",
            crate::config::get().detectors.beneficiary_min_repeat_count,
        );
        let count = input.context.current_beneficiary_hour_count;

        if count < min_repeat as i64 {
            return guard(rule, "beneficiary repeat count within expected range");
        }

        let partial_score = (50.0 * count as f64 / min_repeat as f64).min(100.0);
        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: RuleType::BeneficiaryRapidRepeat,
            triggered: true,
            deviation_pct: partial_score,
            partial_score,
            risk_weight: rule.risk_weight,
            reason: format!("{count} payments to the same beneficiary within the current hour"),
        }
    }
}

pub struct BeneficiaryConcentrationDetector;

impl Detector for BeneficiaryConcentrationDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let profile = input.profile;

        let Some(bene_key) = &input.context.beneficiary_key else {
            return guard(rule, "transaction has no beneficiary");
        };

        let min_distinct = rule.param_u64(
            "minDistinctBeneficiaries",
            crate::config::get().detectors.beneficiary_min_distinct,
        );
        if profile.distinct_beneficiary_count < min_distinct {
            return guard(rule, "too few distinct beneficiaries to assess concentration");
        }

        let bene_txn_count = profile.beneficiaries.get(bene_key).map(|s| s.txn_count).unwrap_or(0);
        if profile.total_txn_count == 0 {
            return guard(rule, "no transaction history");
        }

        let concentration_pct = bene_txn_count as f64 / profile.total_txn_count as f64 * 100.0;
        let expected_pct = 100.0 / profile.distinct_beneficiary_count as f64;
        let abs_min = rule.param_f64(
            "absMinConcentrationPct",
            crate::config::get().detectors.abs_min_concentration_pct,
        );
        let threshold_pct = (expected_pct * (1.0 + rule.variance_pct / 100.0)).max(abs_min);

        if concentration_pct <= threshold_pct {
            return guard(rule, "beneficiary concentration within expected spread");
        }

        let deviation = 100.0 * (concentration_pct - threshold_pct) / threshold_pct.max(super::scoring::EPS);
        let partial_score = super::scoring::score_half_plus(deviation);
        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: RuleType::BeneficiaryConcentration,
            triggered: true,
            deviation_pct: deviation,
            partial_score,
            risk_weight: rule.risk_weight,
            reason: format!(
                "{concentration_pct:.1}% of transactions go to one beneficiary (expected ~{expected_pct:.1}%)"
            ),
        }
    }
}

pub struct BeneficiaryAmountRepetitionDetector;

impl Detector for BeneficiaryAmountRepetitionDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;

        let Some(bene_key) = &input.context.beneficiary_key else {
            return guard(rule, "transaction has no beneficiary");
        };
        let Some(stats) = input.profile.beneficiaries.get(bene_key) else {
            return guard(rule, "no prior history for this beneficiary");
        };
        let Some(sigma) = stats.amount.std_dev() else {
            return guard(rule, "insufficient beneficiary amount samples");
        };
        let mean = stats.amount.ewma;
        if mean.abs() < super::scoring::EPS {
            return guard(rule, "beneficiary mean amount is zero");
        }

        let cv_pct = sigma / mean * 100.0;
        let max_cv_pct = rule.param_f64("maxCvPct", crate::config::get().detectors.max_cv_pct);
        if cv_pct >= max_cv_pct {
            return guard(rule, "beneficiary amount history is not tightly repeated");
        }

        let tolerance = sigma.max(mean * 0.05);
        if (input.txn.amount - mean).abs() > tolerance {
            return guard(rule, "current amount falls outside the repeated band");
        }

        let partial_score = (100.0 * (1.0 - cv_pct / max_cv_pct)).max(50.0);
        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: RuleType::BeneficiaryAmountRepetition,
            triggered: true,
            deviation_pct: partial_score,
            partial_score,
            risk_weight: rule.risk_weight,
            reason: format!("amount repeats a tight historical pattern to this beneficiary (CV {cv_pct:.1}%)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::detectors::test_support::*;
    use crate::types::{BeneficiaryStats, OnlineStat};

    fn init() {
        let _ = config::init_with(config::EngineConfig::default());
    }

    #[test]
    fn rapid_repeat_guards_without_beneficiary() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::BeneficiaryRapidRepeat);
        let txn = txn("NEFT", 100.0);
        let context = fresh_context();
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!BeneficiaryRapidRepeatDetector.evaluate(&input).triggered);
    }

    #[test]
    fn rapid_repeat_triggers_at_min_count() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::BeneficiaryRapidRepeat);
        let txn = bene_txn("NEFT", 100.0, "111");
        let mut context = fresh_context();
        context.beneficiary_key = Some("HDFC0009999:111".into());
        context.current_beneficiary_hour_count = 5;
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        let result = BeneficiaryRapidRepeatDetector.evaluate(&input);
        assert!(result.triggered);
        assert_eq!(result.partial_score, 50.0);
    }

    #[test]
    fn concentration_guards_below_min_distinct() {
        init();
        let mut profile = fresh_profile("C1");
        profile.distinct_beneficiary_count = 1;
        let rule = rule(RuleType::BeneficiaryConcentration);
        let txn = bene_txn("NEFT", 100.0, "111");
        let mut context = fresh_context();
        context.beneficiary_key = Some("HDFC0009999:111".into());
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!BeneficiaryConcentrationDetector.evaluate(&input).triggered);
    }

    #[test]
    fn concentration_triggers_when_one_beneficiary_dominates() {
        init();
        let mut profile = fresh_profile("C1");
        profile.total_txn_count = 100;
        profile.distinct_beneficiary_count = 5;
        profile
            .beneficiaries
            .insert("HDFC0009999:111".into(), BeneficiaryStats { txn_count: 80, amount: OnlineStat::default() });
        let rule = rule(RuleType::BeneficiaryConcentration);
        let txn = bene_txn("NEFT", 100.0, "111");
        let mut context = fresh_context();
        context.beneficiary_key = Some("HDFC0009999:111".into());
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(BeneficiaryConcentrationDetector.evaluate(&input).triggered);
    }

    #[test]
    fn amount_repetition_guards_without_history() {
        init();
        let profile = fresh_profile("C1");
        let rule = rule(RuleType::BeneficiaryAmountRepetition);
        let txn = bene_txn("NEFT", 100.0, "111");
        let mut context = fresh_context();
        context.beneficiary_key = Some("HDFC0009999:111".into());
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(!BeneficiaryAmountRepetitionDetector.evaluate(&input).triggered);
    }

    #[test]
    fn amount_repetition_triggers_for_tight_repeated_amounts() {
        init();
        let mut profile = fresh_profile("C1");
        let mut amount = OnlineStat::default();
        for _ in 0..20 {
            amount.update(500.0, 0.3);
        }
        profile
            .beneficiaries
            .insert("HDFC0009999:111".into(), BeneficiaryStats { txn_count: 20, amount });
        let rule = rule(RuleType::BeneficiaryAmountRepetition);
        let txn = bene_txn("NEFT", 500.0, "111");
        let mut context = fresh_context();
        context.beneficiary_key = Some("HDFC0009999:111".into());
        let input = DetectorInput::new(&txn, &profile, &rule, &context);
        assert!(BeneficiaryAmountRepetitionDetector.evaluate(&input).triggered);
    }
}
