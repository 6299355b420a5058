//! `AnomalyRule` — persisted, cached detector configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The fifteen detector kinds in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    TransactionTypeAnomaly,
    TpsSpike,
    AmountAnomaly,
    HourlyAmountAnomaly,
    AmountPerType,
    BeneficiaryRapidRepeat,
    BeneficiaryConcentration,
    BeneficiaryAmountRepetition,
    DailyCumulativeAmount,
    NewBeneficiaryVelocity,
    DormancyReactivation,
    CrossChannelBeneficiaryAmount,
    SeasonalDeviation,
    MuleNetwork,
    IsolationForest,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::TransactionTypeAnomaly => "TRANSACTION_TYPE_ANOMALY",
            RuleType::TpsSpike => "TPS_SPIKE",
            RuleType::AmountAnomaly => "AMOUNT_ANOMALY",
            RuleType::HourlyAmountAnomaly => "HOURLY_AMOUNT_ANOMALY",
            RuleType::AmountPerType => "AMOUNT_PER_TYPE",
            RuleType::BeneficiaryRapidRepeat => "BENEFICIARY_RAPID_REPEAT",
            RuleType::BeneficiaryConcentration => "BENEFICIARY_CONCENTRATION",
            RuleType::BeneficiaryAmountRepetition => "BENEFICIARY_AMOUNT_REPETITION",
            RuleType::DailyCumulativeAmount => "DAILY_CUMULATIVE_AMOUNT",
            RuleType::NewBeneficiaryVelocity => "NEW_BENEFICIARY_VELOCITY",
            RuleType::DormancyReactivation => "DORMANCY_REACTIVATION",
            RuleType::CrossChannelBeneficiaryAmount => "CROSS_CHANNEL_BENEFICIARY_AMOUNT",
            RuleType::SeasonalDeviation => "SEASONAL_DEVIATION",
            RuleType::MuleNetwork => "MULE_NETWORK",
            RuleType::IsolationForest => "ISOLATION_FOREST",
        }
    }

    pub fn all() -> [RuleType; 15] {
        [
            RuleType::TransactionTypeAnomaly,
            RuleType::TpsSpike,
            RuleType::AmountAnomaly,
            RuleType::HourlyAmountAnomaly,
            RuleType::AmountPerType,
            RuleType::BeneficiaryRapidRepeat,
            RuleType::BeneficiaryConcentration,
            RuleType::BeneficiaryAmountRepetition,
            RuleType::DailyCumulativeAmount,
            RuleType::NewBeneficiaryVelocity,
            RuleType::DormancyReactivation,
            RuleType::CrossChannelBeneficiaryAmount,
            RuleType::SeasonalDeviation,
            RuleType::MuleNetwork,
            RuleType::IsolationForest,
        ]
    }
}

/// Lower bound for `riskWeight`, enforced by the tuner.
pub const RISK_WEIGHT_FLOOR: f64 = 0.5;
/// Upper bound for `riskWeight`, enforced by the tuner.
pub const RISK_WEIGHT_CEILING: f64 = 5.0;

/// A detector's persisted configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyRule {
    pub rule_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub variance_pct: f64,
    pub risk_weight: f64,
    pub enabled: bool,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl AnomalyRule {
    pub fn new(rule_id: impl Into<String>, name: impl Into<String>, rule_type: RuleType) -> Self {
        Self {
            rule_id: rule_id.into(),
            name: name.into(),
            rule_type,
            variance_pct: 50.0,
            risk_weight: 1.0,
            enabled: true,
            params: HashMap::new(),
        }
    }

    pub fn with_variance_pct(mut self, pct: f64) -> Self {
        self.variance_pct = pct;
        self
    }

    pub fn with_risk_weight(mut self, weight: f64) -> Self {
        self.risk_weight = weight.clamp(RISK_WEIGHT_FLOOR, RISK_WEIGHT_CEILING);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Typed param lookup with a default, used pervasively by detectors for
    /// their own knobs (`minRepeatCount`, `maxCvPct`, ...).
    pub fn param_f64(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(default)
    }

    pub fn param_u64(&self, key: &str, default: u64) -> u64 {
        self.params
            .get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_weight_clamped_on_construction() {
        let rule = AnomalyRule::new("R1", "test", RuleType::AmountAnomaly).with_risk_weight(9.0);
        assert_eq!(rule.risk_weight, RISK_WEIGHT_CEILING);
    }

    #[test]
    fn param_lookup_falls_back_to_default() {
        let rule = AnomalyRule::new("R1", "test", RuleType::DormancyReactivation);
        assert_eq!(rule.param_f64("dormancyDays", 30.0), 30.0);
        let rule = rule.with_param("dormancyDays", "45");
        assert_eq!(rule.param_f64("dormancyDays", 30.0), 45.0);
    }

    #[test]
    fn rule_type_round_trips_through_serde() {
        let json = serde_json::to_string(&RuleType::MuleNetwork).unwrap();
        let back: RuleType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RuleType::MuleNetwork);
    }
}
