//! Mule network: combines three independent signals over
//! the beneficiary graph — fan-in on this beneficiary, how concentrated
//! the client's own beneficiaries are among shared ones, and how
//! interconnected its neighbourhood is — and requires at least two of the
//! three to be active before a composite score is even computed, to keep
//! a single noisy signal from carrying the whole detector.

use crate::types::{RuleResult, RuleType};

use super::scoring::guard;
use super::{Detector, DetectorInput};

pub struct MuleNetworkDetector;

impl Detector for MuleNetworkDetector {
    fn evaluate(&self, input: &DetectorInput) -> RuleResult {
        let rule = input.rule;
        let config = crate::config::get();
        let mule_config = &config.mule_network;

        let Some(graph) = input.graph else {
            return guard(rule, "beneficiary graph not yet built");
        };
        let Some(bene_key) = &input.context.beneficiary_key else {
            return guard(rule, "transaction has no beneficiary");
        };

        let min_fan_in = rule.param_u64("minFanIn", mule_config.min_fan_in);
        let other_senders = graph.other_senders(bene_key, &input.txn.client_id).len() as u64;
        let fan_in_active = other_senders >= min_fan_in;
        let fan_in_score = if fan_in_active {
            let min = (min_fan_in.max(1)) as f64;
            (((other_senders as f64 - min) / (2.0 * min).max(1.0)) * 100.0)
                .clamp(0.0, 100.0)
                .max(30.0)
        } else {
            0.0
        };

        let total_benes = graph.total_beneficiary_count(&input.txn.client_id);
        let shared_benes = graph.shared_beneficiary_count(&input.txn.client_id);
        let shared_pct = if total_benes > 0 {
            shared_benes as f64 / total_benes as f64 * 100.0
        } else {
            0.0
        };
        let shared_threshold = rule.param_f64("sharedBenePctThreshold", mule_config.shared_bene_pct_threshold);
        let shared_active = shared_pct >= shared_threshold;
        let shared_score = if shared_active { shared_pct.clamp(0.0, 100.0).max(30.0) } else { 0.0 };

        let density = graph.network_density(&input.txn.client_id);
        let density_threshold = rule.param_f64("densityThreshold", mule_config.density_threshold);
        let density_active = density >= density_threshold;
        let density_score = if density_active { (density * 100.0).clamp(0.0, 100.0).max(30.0) } else { 0.0 };

        let active_signals = [fan_in_active, shared_active, density_active].iter().filter(|b| **b).count();
        if active_signals < 2 {
            return guard(rule, "fewer than two mule-network signals active");
        }

        let weight_fan_in = rule.param_f64("weightFanIn", mule_config.weight_fan_in);
        let weight_shared = rule.param_f64("weightShared", mule_config.weight_shared);
        let weight_density = rule.param_f64("weightDensity", mule_config.weight_density);

        let composite = fan_in_score * weight_fan_in + shared_score * weight_shared + density_score * weight_density;
        let composite_threshold = rule.param_f64("compositeThreshold", mule_config.composite_threshold);

        if composite <= composite_threshold {
            return guard(rule, "composite mule-network score below threshold");
        }

        RuleResult {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            rule_type: RuleType::MuleNetwork,
            triggered: true,
            deviation_pct: composite,
            partial_score: composite.clamp(0.0, 100.0),
            risk_weight: rule.risk_weight,
            reason: format!(
                "mule-network signals active ({active_signals}/3): fan-in={other_senders}, shared={shared_pct:.1}%, density={density:.2}"
            ),
        }
    }
}
