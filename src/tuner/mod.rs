//! Auto-tuner: periodically adjusts each rule's
//! `riskWeight` from its accumulated true/false-positive feedback, so a
//! rule that's mostly noise quietly loses influence over the composite
//! score instead of needing a manual tune.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::config::defaults;
use crate::error::StoreError;
use crate::rules::RuleRegistry;
use crate::store::Store;
use crate::types::{FeedbackStatus, ReviewQueueItem, RuleWeightChange};

/// Per-rule true/false-positive tallies gathered from reviewed queue items.
#[derive(Debug, Default, Clone, Copy)]
struct FeedbackTally {
    tp: u64,
    fp: u64,
}

/// Aggregates TP/FP counts per rule id from every reviewed item.
fn aggregate_feedback(items: &[ReviewQueueItem]) -> std::collections::HashMap<String, FeedbackTally> {
    let mut tallies: std::collections::HashMap<String, FeedbackTally> = std::collections::HashMap::new();
    for item in items {
        let tally_update: fn(&mut FeedbackTally) = match item.feedback_status {
            FeedbackStatus::TruePositive => |t: &mut FeedbackTally| t.tp += 1,
            FeedbackStatus::FalsePositive => |t: &mut FeedbackTally| t.fp += 1,
            _ => continue,
        };
        for rule_id in &item.triggered_rule_ids {
            tally_update(tallies.entry(rule_id.clone()).or_default());
        }
    }
    tallies
}

/// Runs one tuning pass: aggregates feedback, computes each rule's new
/// weight, persists weights that moved enough to matter, and appends an
/// audit record for each.
pub async fn run_tuning_pass<S: Store>(
    store: &Arc<S>,
    registry: &RuleRegistry<S>,
) -> Result<Vec<RuleWeightChange>, StoreError> {
    let config = crate::config::get();
    let feedback = &config.feedback;

    let all_items: Vec<ReviewQueueItem> = store.scan_all(defaults::SET_REVIEW_QUEUE).await?;
    let tallies = aggregate_feedback(&all_items);

    let snapshot = registry.active_rules();
    let mut changes = Vec::new();

    for rule in &snapshot.rules {
        let Some(tally) = tallies.get(&rule.rule_id) else {
            continue;
        };
        let total = tally.tp + tally.fp;
        if total < feedback.min_samples_for_tuning {
            continue;
        }

        // Step 3: factor > 0 rewards a clean rule, < 0 penalizes a noisy one.
        let tp_fp_ratio = tally.tp as f64 / total as f64;
        let factor = ((tp_fp_ratio - 0.5) * 2.0).clamp(-feedback.max_adjustment_pct, feedback.max_adjustment_pct);
        let proposed_weight =
            ((rule.risk_weight * (1.0 + factor)).clamp(feedback.weight_floor, feedback.weight_ceiling) * 1000.0).round()
                / 1000.0;

        // Step 4: skip changes too small to be worth persisting.
        if (proposed_weight - rule.risk_weight).abs() < 0.001 {
            continue;
        }

        let mut updated_rule = rule.clone();
        updated_rule.risk_weight = proposed_weight;
        registry.save(&updated_rule).await?;

        let change = RuleWeightChange {
            rule_id: rule.rule_id.clone(),
            old_weight: rule.risk_weight,
            new_weight: proposed_weight,
            tp_count: tally.tp,
            fp_count: tally.fp,
            tp_fp_ratio,
            adjusted_at: Utc::now().timestamp_millis(),
        };
        store
            .put(defaults::SET_RULE_WEIGHT_HISTORY, &format!("{}:{}", change.rule_id, change.adjusted_at), &change)
            .await?;
        info!(rule_id = %change.rule_id, old = change.old_weight, new = change.new_weight, "rule weight tuned");
        changes.push(change);
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::store::MemoryStore;
    use crate::types::{Action, AnomalyRule, RiskLevel, RuleType};

    fn init() {
        let _ = config::init_with(config::EngineConfig::default());
    }

    #[tokio::test]
    async fn tuner_leaves_rules_below_sample_threshold_untouched() {
        init();
        let store = Arc::new(MemoryStore::new());
        let registry = RuleRegistry::new(store.clone());
        registry.save(&AnomalyRule::new("R1", "amount anomaly", RuleType::AmountAnomaly)).await.unwrap();

        let item = ReviewQueueItem::new("T1", "C1", Action::Alert, 50.0, RiskLevel::Medium, vec!["R1".into()], 0, 1000);
        store.put(defaults::SET_REVIEW_QUEUE, "T1", &item).await.unwrap();

        let changes = run_tuning_pass(&store, &registry).await.unwrap();
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn tuner_rewards_a_clean_rule_with_a_higher_weight() {
        init();
        let store = Arc::new(MemoryStore::new());
        let registry = RuleRegistry::new(store.clone());
        registry
            .save(&AnomalyRule::new("R1", "amount anomaly", RuleType::AmountAnomaly).with_risk_weight(1.0))
            .await
            .unwrap();

        for i in 0..60 {
            let mut item =
                ReviewQueueItem::new(format!("T{i}"), "C1", Action::Alert, 50.0, RiskLevel::Medium, vec!["R1".into()], i, 1000);
            item.feedback_status = FeedbackStatus::TruePositive;
            store.put(defaults::SET_REVIEW_QUEUE, &item.txn_id.clone(), &item).await.unwrap();
        }

        let changes = run_tuning_pass(&store, &registry).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].new_weight > changes[0].old_weight);
    }
}
