//! The fifteen behavioural detectors and the
//! registry that dispatches a rule to its detector: [`DetectorRegistry`]
//! holds a `HashMap<RuleType, Box<dyn Detector>>` rather than a class
//! hierarchy, mirroring the rule registry's own `ArcSwap`-published lookup
//! table in [`crate::rules`].

mod amount;
mod beneficiary;
mod cross_channel;
mod daily;
mod dormancy;
mod isolation_forest;
mod mule_network;
pub mod scoring;
mod seasonal;
mod transaction_type;
mod velocity;

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::context::EvaluationContext;
use crate::graph::GraphSnapshot;
use crate::types::{AnomalyRule, ClientProfile, IsolationForestModel, RuleResult, RuleType, Transaction};

/// Everything a detector needs to evaluate one rule against one
/// transaction. Detectors never touch the store directly — all live state
/// is read ahead of time into `profile` and `context`.
pub struct DetectorInput<'a> {
    pub txn: &'a Transaction,
    pub profile: &'a ClientProfile,
    pub rule: &'a AnomalyRule,
    pub context: &'a EvaluationContext,
    pub graph: Option<&'a GraphSnapshot>,
    pub forest_model: Option<&'a IsolationForestModel>,
}

impl<'a> DetectorInput<'a> {
    pub fn new(
        txn: &'a Transaction,
        profile: &'a ClientProfile,
        rule: &'a AnomalyRule,
        context: &'a EvaluationContext,
    ) -> Self {
        Self { txn, profile, rule, context, graph: None, forest_model: None }
    }

    pub fn with_graph(mut self, graph: &'a GraphSnapshot) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_forest_model(mut self, model: &'a IsolationForestModel) -> Self {
        self.forest_model = Some(model);
        self
    }
}

/// A single behavioural rule evaluator. Implementations are pure functions
/// of [`DetectorInput`] — no I/O, no interior mutability.
pub trait Detector: Send + Sync {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult;
}

/// Maps each [`RuleType`] to its detector and recovers from a panicking or
/// otherwise malfunctioning detector by treating it as not-triggered
/// ("evaluator error" must never abort the pipeline).
pub struct DetectorRegistry {
    detectors: HashMap<RuleType, Box<dyn Detector>>,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorRegistry {
    pub fn new() -> Self {
        let mut detectors: HashMap<RuleType, Box<dyn Detector>> = HashMap::new();
        detectors.insert(
            RuleType::TransactionTypeAnomaly,
            Box::new(transaction_type::TransactionTypeAnomalyDetector),
        );
        detectors.insert(RuleType::TpsSpike, Box::new(velocity::TpsSpikeDetector));
        detectors.insert(RuleType::AmountAnomaly, Box::new(amount::AmountAnomalyDetector));
        detectors.insert(
            RuleType::HourlyAmountAnomaly,
            Box::new(amount::HourlyAmountAnomalyDetector),
        );
        detectors.insert(RuleType::AmountPerType, Box::new(amount::AmountPerTypeDetector));
        detectors.insert(
            RuleType::BeneficiaryRapidRepeat,
            Box::new(beneficiary::BeneficiaryRapidRepeatDetector),
        );
        detectors.insert(
            RuleType::BeneficiaryConcentration,
            Box::new(beneficiary::BeneficiaryConcentrationDetector),
        );
        detectors.insert(
            RuleType::BeneficiaryAmountRepetition,
            Box::new(beneficiary::BeneficiaryAmountRepetitionDetector),
        );
        detectors.insert(
            RuleType::DailyCumulativeAmount,
            Box::new(daily::DailyCumulativeAmountDetector),
        );
        detectors.insert(
            RuleType::NewBeneficiaryVelocity,
            Box::new(daily::NewBeneficiaryVelocityDetector),
        );
        detectors.insert(
            RuleType::DormancyReactivation,
            Box::new(dormancy::DormancyReactivationDetector),
        );
        detectors.insert(
            RuleType::CrossChannelBeneficiaryAmount,
            Box::new(cross_channel::CrossChannelBeneficiaryAmountDetector),
        );
        detectors.insert(RuleType::SeasonalDeviation, Box::new(seasonal::SeasonalDeviationDetector));
        detectors.insert(RuleType::MuleNetwork, Box::new(mule_network::MuleNetworkDetector));
        detectors.insert(
            RuleType::IsolationForest,
            Box::new(isolation_forest::IsolationForestDetector),
        );
        Self { detectors }
    }

    /// Evaluates `input.rule` against its registered detector, recovering
    /// from a panic as a not-triggered "evaluator error" result.
    pub fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        match self.detectors.get(&rule.rule_type) {
            Some(detector) => {
                match catch_unwind(AssertUnwindSafe(|| detector.evaluate(input))) {
                    Ok(result) => result,
                    Err(_) => scoring::guard(rule, "evaluator error"),
                }
            }
            None => scoring::guard(rule, "no detector registered for this rule type"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::EvaluationContext;
    use crate::types::{AnomalyRule, ClientProfile, RuleType, SeasonalSlot, Transaction};

    pub fn fresh_profile(client_id: &str) -> ClientProfile {
        ClientProfile::new(client_id)
    }

    pub fn rule(rule_type: RuleType) -> AnomalyRule {
        AnomalyRule::new("R1", "test-rule", rule_type).with_variance_pct(20.0)
    }

    pub fn txn(txn_type: &str, amount: f64) -> Transaction {
        Transaction {
            txn_id: "T1".into(),
            client_id: "C1".into(),
            txn_type: txn_type.into(),
            amount,
            timestamp: 1_700_000_000_000,
            beneficiary_ifsc: None,
            beneficiary_account: None,
        }
    }

    pub fn bene_txn(txn_type: &str, amount: f64, account: &str) -> Transaction {
        Transaction {
            beneficiary_ifsc: Some("HDFC0009999".into()),
            beneficiary_account: Some(account.into()),
            ..txn(txn_type, amount)
        }
    }

    pub fn fresh_context() -> EvaluationContext {
        EvaluationContext {
            hour_bucket: "2024010101".into(),
            day_bucket: "20240101".into(),
            current_hour_count: 0,
            current_hour_amount: 0.0,
            current_day_count: 0,
            current_day_amount: 0.0,
            current_day_new_bene_count: 0,
            beneficiary_key: None,
            current_beneficiary_hour_count: 0,
            current_beneficiary_hour_amount: 0.0,
            current_daily_beneficiary_amount: 0.0,
            hour_of_day_slot: SeasonalSlot::default(),
            day_of_week_slot: SeasonalSlot::default(),
        }
    }
}
