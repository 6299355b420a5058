//! Evaluation context builder:
//! reads the live counters and seasonal slots a detector needs for the
//! current transaction, so detectors themselves stay pure functions of
//! `(txn, profile, rule, context)` with no store access of their own.

use crate::error::StoreError;
use crate::profile::ProfileService;
use crate::store::Store;
use crate::types::{self, ClientProfile, SeasonalSlot, Transaction};

/// Everything a detector needs beyond the pre-update profile, read fresh
/// for this transaction.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub hour_bucket: String,
    pub day_bucket: String,
    pub current_hour_count: i64,
    pub current_hour_amount: f64,
    pub current_day_count: i64,
    pub current_day_amount: f64,
    pub current_day_new_bene_count: i64,
    pub beneficiary_key: Option<String>,
    pub current_beneficiary_hour_count: i64,
    pub current_beneficiary_hour_amount: f64,
    pub current_daily_beneficiary_amount: f64,
    pub hour_of_day_slot: SeasonalSlot,
    pub day_of_week_slot: SeasonalSlot,
}

impl EvaluationContext {
    pub async fn build<S: Store>(
        profiles: &ProfileService<S>,
        profile: &ClientProfile,
        txn: &Transaction,
    ) -> Result<Self, StoreError> {
        let client_id = &profile.client_id;
        let ts = txn.timestamp;
        let beneficiary_key = txn.beneficiary_key();

        let (current_beneficiary_hour_count, current_beneficiary_hour_amount, current_daily_beneficiary_amount) =
            if let Some(bene_key) = &beneficiary_key {
                (
                    profiles.current_beneficiary_count(client_id, bene_key, ts).await?,
                    profiles.current_beneficiary_amount(client_id, bene_key, ts).await?,
                    profiles
                        .current_daily_beneficiary_amount(client_id, bene_key, ts)
                        .await?,
                )
            } else {
                (0, 0.0, 0.0)
            };

        Ok(Self {
            hour_bucket: types::hour_bucket(ts),
            day_bucket: types::day_bucket(ts),
            current_hour_count: profiles.current_hourly_count(client_id, ts).await?,
            current_hour_amount: profiles.current_hourly_amount(client_id, ts).await?,
            current_day_count: profiles.current_daily_count(client_id, ts).await?,
            current_day_amount: profiles.current_daily_amount(client_id, ts).await?,
            current_day_new_bene_count: profiles.current_daily_new_bene_count(client_id, ts).await?,
            beneficiary_key,
            current_beneficiary_hour_count,
            current_beneficiary_hour_amount,
            current_daily_beneficiary_amount,
            hour_of_day_slot: profile.hour_of_day[types::hour_of_day(ts)],
            day_of_week_slot: profile.day_of_week[types::day_of_week(ts)],
        })
    }
}
