//! `ClientProfile` — the online behavioural state the engine maintains per
//! client. Updated by `crate::profile::service` after detectors
//! have consumed the pre-update snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Online mean/variance tracker combining an exposed EWMA (used as the
/// detector baseline) with a classical Welford accumulator that drives
/// `m2` off the plain running arithmetic mean.
///
/// The two means are deliberately kept separate: `ewma` reacts to recent
/// behaviour (detector baseline), while the internal arithmetic mean
/// feeding `m2` is what makes `variance()` match the textbook two-pass
/// sample variance — an EWMA-weighted M2 would
/// not have that guarantee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct OnlineStat {
    pub ewma: f64,
    mean: f64,
    pub m2: f64,
    pub count: u64,
}

impl OnlineStat {
    pub fn update(&mut self, x: f64, alpha: f64) {
        self.count += 1;
        self.ewma = alpha * x + (1.0 - alpha) * self.ewma;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    /// Sample variance, `m2 / max(1, n-1)`.
    pub fn variance(&self) -> f64 {
        self.m2 / (self.count.saturating_sub(1)).max(1) as f64
    }

    /// Standard deviation, never exposed for `count < 2`.
    pub fn std_dev(&self) -> Option<f64> {
        if self.count < 2 {
            None
        } else {
            Some(self.variance().sqrt())
        }
    }
}

/// EWMA + sample-count pair for one seasonal bucket (hour-of-day or
/// day-of-week), tracking both a rate metric (tps) and an amount metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct SeasonalSlot {
    pub ewma_tps: f64,
    pub count_tps: u64,
    pub ewma_amount: f64,
    pub count_amount: u64,
}

impl SeasonalSlot {
    pub fn update_tps(&mut self, observed: f64, alpha: f64) {
        self.ewma_tps = alpha * observed + (1.0 - alpha) * self.ewma_tps;
        self.count_tps += 1;
    }

    pub fn update_amount(&mut self, observed: f64, alpha: f64) {
        self.ewma_amount = alpha * observed + (1.0 - alpha) * self.ewma_amount;
        self.count_amount += 1;
    }
}

/// Per-beneficiary aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BeneficiaryStats {
    pub txn_count: u64,
    pub amount: OnlineStat,
}

/// Hourly rollup state, rolled forward on `hourBucket` change.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HourlyAggregate {
    pub ewma_tps: f64,
    pub tps_m2: f64,
    pub tps_mean: f64,
    pub ewma_amount: f64,
    pub amount_m2: f64,
    pub amount_mean: f64,
    pub completed_hours_count: u64,
    pub last_hour_bucket: Option<String>,
}

impl HourlyAggregate {
    /// Feed one completed hour's `(count, amount)` into the seasonal-free
    /// global hourly baselines using the classical Welford recurrence for
    /// `m2` and an EWMA for the exposed baseline, same split as
    /// [`OnlineStat`].
    pub fn roll(&mut self, completed_count: f64, completed_amount: f64, alpha: f64) {
        self.completed_hours_count += 1;
        self.ewma_tps = alpha * completed_count + (1.0 - alpha) * self.ewma_tps;
        let delta = completed_count - self.tps_mean;
        self.tps_mean += delta / self.completed_hours_count as f64;
        let delta2 = completed_count - self.tps_mean;
        self.tps_m2 += delta * delta2;

        self.ewma_amount = alpha * completed_amount + (1.0 - alpha) * self.ewma_amount;
        let delta = completed_amount - self.amount_mean;
        self.amount_mean += delta / self.completed_hours_count as f64;
        let delta2 = completed_amount - self.amount_mean;
        self.amount_m2 += delta * delta2;
    }
}

/// Daily rollup state, analogous to [`HourlyAggregate`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DailyAggregate {
    pub ewma_amount: f64,
    pub amount_m2: f64,
    pub amount_mean: f64,
    pub completed_days_count: u64,
    pub ewma_new_beneficiaries: f64,
    pub new_bene_m2: f64,
    pub new_bene_mean: f64,
    pub completed_days_for_bene_count: u64,
    pub last_day_bucket: Option<String>,
}

impl DailyAggregate {
    pub fn roll_amount(&mut self, completed_amount: f64, alpha: f64) {
        self.completed_days_count += 1;
        self.ewma_amount = alpha * completed_amount + (1.0 - alpha) * self.ewma_amount;
        let delta = completed_amount - self.amount_mean;
        self.amount_mean += delta / self.completed_days_count as f64;
        let delta2 = completed_amount - self.amount_mean;
        self.amount_m2 += delta * delta2;
    }

    pub fn roll_new_bene(&mut self, completed_new_bene: f64, alpha: f64) {
        self.completed_days_for_bene_count += 1;
        self.ewma_new_beneficiaries =
            alpha * completed_new_bene + (1.0 - alpha) * self.ewma_new_beneficiaries;
        let delta = completed_new_bene - self.new_bene_mean;
        self.new_bene_mean += delta / self.completed_days_for_bene_count as f64;
        let delta2 = completed_new_bene - self.new_bene_mean;
        self.new_bene_m2 += delta * delta2;
    }
}

/// The mutable, online-learned behavioural profile for one client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientProfile {
    pub client_id: String,
    pub total_txn_count: u64,
    pub amount: OnlineStat,
    pub amount_by_type: HashMap<String, OnlineStat>,
    pub type_counts: HashMap<String, u64>,
    pub hourly: HourlyAggregate,
    pub daily: DailyAggregate,
    /// Hour-of-day (0..23) seasonal slots.
    pub hour_of_day: [SeasonalSlot; 24],
    /// Day-of-week (0..6, Monday=0) seasonal slots.
    pub day_of_week: [SeasonalSlot; 7],
    pub beneficiaries: HashMap<String, BeneficiaryStats>,
    pub distinct_beneficiary_count: u64,
    pub last_updated: i64,
}

impl ClientProfile {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            total_txn_count: 0,
            amount: OnlineStat::default(),
            amount_by_type: HashMap::new(),
            type_counts: HashMap::new(),
            hourly: HourlyAggregate::default(),
            daily: DailyAggregate::default(),
            hour_of_day: [SeasonalSlot::default(); 24],
            day_of_week: [SeasonalSlot::default(); 7],
            beneficiaries: HashMap::new(),
            distinct_beneficiary_count: 0,
            last_updated: 0,
        }
    }

    /// Type frequency `count(type)/totalTxnCount`, `0.0` for an unseen type
    /// or an empty profile.
    pub fn type_frequency(&self, txn_type: &str) -> f64 {
        if self.total_txn_count == 0 {
            return 0.0;
        }
        let count = self.type_counts.get(txn_type).copied().unwrap_or(0);
        count as f64 / self.total_txn_count as f64
    }

    /// Invariant I1: `totalTxnCount == sum(type_counts)`.
    pub fn invariant_total_matches_types(&self) -> bool {
        self.total_txn_count == self.type_counts.values().sum::<u64>()
    }

    /// Invariant I2: `distinctBeneficiaryCount == |{keys with count>0}|`.
    pub fn invariant_bene_count_matches(&self) -> bool {
        self.distinct_beneficiary_count
            == self
                .beneficiaries
                .values()
                .filter(|b| b.txn_count > 0)
                .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_amounts_drive_m2_to_zero() {
        let mut stat = OnlineStat::default();
        for _ in 0..50 {
            stat.update(100.0, 0.2);
        }
        assert!((stat.m2).abs() < 1e-9);
        assert!((stat.ewma - 100.0).abs() < 1e-6);
    }

    #[test]
    fn welford_matches_two_pass_variance() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stat = OnlineStat::default();
        for &x in &samples {
            stat.update(x, 0.3);
        }
        let mean: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        let two_pass_var: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
            / (samples.len() as f64 - 1.0);
        assert!((stat.variance() - two_pass_var).abs() < 1e-9);
    }

    #[test]
    fn std_dev_hidden_below_two_samples() {
        let mut stat = OnlineStat::default();
        stat.update(10.0, 0.5);
        assert_eq!(stat.std_dev(), None);
        stat.update(12.0, 0.5);
        assert!(stat.std_dev().is_some());
    }

    #[test]
    fn type_frequency_empty_profile_is_zero() {
        let profile = ClientProfile::new("C1");
        assert_eq!(profile.type_frequency("NEFT"), 0.0);
    }

    #[test]
    fn invariants_hold_for_fresh_profile() {
        let profile = ClientProfile::new("C1");
        assert!(profile.invariant_total_matches_types());
        assert!(profile.invariant_bene_count_matches());
    }
}
