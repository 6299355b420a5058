//! The eight standardized features extracted per transaction.
//! Order is load-bearing: training and scoring MUST agree bit-for-bit on
//! feature order or the model is invalid.

use std::f64::consts::PI;

use crate::context::EvaluationContext;
use crate::types::{ClientProfile, FeatureVector, Transaction};

const EPS: f64 = 1e-9;

pub fn extract_features(txn: &Transaction, profile: &ClientProfile, context: &EvaluationContext) -> FeatureVector {
    let amount_z = {
        let sigma = profile.amount.std_dev().unwrap_or(EPS).max(EPS);
        (txn.amount - profile.amount.ewma) / sigma
    };

    let amount_z_by_type = {
        let stat = profile.amount_by_type.get(&txn.txn_type);
        match stat {
            Some(stat) => {
                let sigma = stat.std_dev().unwrap_or(EPS).max(EPS);
                (txn.amount - stat.ewma) / sigma
            }
            None => 0.0,
        }
    };

    let hourly_count_log_ratio =
        (1.0 + context.current_hour_count as f64).ln() - (1.0 + profile.hourly.ewma_tps).ln();
    let hourly_amount_log_ratio =
        (1.0 + context.current_hour_amount).ln() - (1.0 + profile.hourly.ewma_amount).ln();

    let type_frequency = profile.type_frequency(&txn.txn_type);

    let hour_of_day = crate::types::hour_of_day(txn.timestamp) as f64;
    let hour_angle = 2.0 * PI * hour_of_day / 24.0;
    let day_of_week = crate::types::day_of_week(txn.timestamp) as f64;

    [
        amount_z,
        amount_z_by_type,
        hourly_count_log_ratio,
        hourly_amount_log_ratio,
        type_frequency,
        hour_angle.sin(),
        hour_angle.cos(),
        day_of_week / 6.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn feature_vector_has_eight_entries_in_stable_order() {
        let _ = config::init_with(config::EngineConfig::default());
        let profiles = crate::profile::ProfileService::new(Arc::new(MemoryStore::new()));
        let profile = profiles.get_or_create("C1").await.unwrap();
        let txn = Transaction {
            txn_id: "T1".into(),
            client_id: "C1".into(),
            txn_type: "NEFT".into(),
            amount: 500.0,
            timestamp: 1_700_000_000_000,
            beneficiary_ifsc: None,
            beneficiary_account: None,
        };
        let context = EvaluationContext::build(&profiles, &profile, &txn).await.unwrap();
        let features = extract_features(&txn, &profile, &context);
        assert_eq!(features.len(), 8);
        assert!(features.iter().all(|f| f.is_finite()));
        // hour-of-day sin/cos stay within the unit circle.
        assert!(features[5].abs() <= 1.0);
        assert!(features[6].abs() <= 1.0);
    }
}
