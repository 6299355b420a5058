//! Profile service: online EWMA/Welford updates, hour/day rollover, and
//! the counter read API detectors and context building consume. The
//! Welford recurrence generalizes a single rolling statistic into the
//! full per-client/per-type/per-beneficiary/seasonal state the profile owns.

mod keys;

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::config::{self, defaults};
use crate::error::StoreError;
use crate::store::Store;
use crate::types::{self, ClientProfile};
use crate::types::Transaction;

/// Stateless facade over a [`Store`] implementing the profile lifecycle
///. Cheap to clone (just an `Arc` bump) so it can be shared
/// across the worker pool.
pub struct ProfileService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ProfileService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> ProfileService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the persisted profile, or a fresh empty one. Never writes.
    pub async fn get_or_create(&self, client_id: &str) -> Result<ClientProfile, StoreError> {
        match self
            .store
            .get::<ClientProfile>(defaults::SET_CLIENT_PROFILES, client_id)
            .await?
        {
            Some(profile) => Ok(profile),
            None => Ok(ClientProfile::new(client_id)),
        }
    }

    /// Applies the 8-step update procedure and persists the
    /// result. Must be called AFTER detectors have consumed the pre-update
    /// profile — `profile` is mutated in place.
    pub async fn update(&self, profile: &mut ClientProfile, txn: &Transaction) -> Result<(), StoreError> {
        let config = config::get();
        let alpha = config.scoring.ewma_alpha;
        let hourly_alpha = config.scoring.hourly_alpha();
        let daily_alpha = config.scoring.daily_alpha();
        let amount_paise = txn.amount_paise();

        // Step 1
        *profile.type_counts.entry(txn.txn_type.clone()).or_insert(0) += 1;
        profile.total_txn_count += 1;

        // Step 2
        profile.amount.update(txn.amount, alpha);

        // Step 3
        profile
            .amount_by_type
            .entry(txn.txn_type.clone())
            .or_default()
            .update(txn.amount, alpha);

        // Step 4: hour rollover
        let hour_bucket = types::hour_bucket(txn.timestamp);
        if profile.hourly.last_hour_bucket.as_deref() != Some(hour_bucket.as_str()) {
            if let Some(prev_bucket) = profile.hourly.last_hour_bucket.clone() {
                let prev_key = keys::hourly_txn_key(&profile.client_id, &prev_bucket);
                let count = self
                    .store
                    .add_and_get(defaults::SET_CLIENT_HOURLY_COUNTERS, &prev_key, "count", 0)
                    .await?;
                let amount_paise = self
                    .store
                    .add_and_get(defaults::SET_CLIENT_HOURLY_COUNTERS, &prev_key, "amount", 0)
                    .await?;
                let amount = amount_paise as f64 / 100.0;
                profile.hourly.roll(count as f64, amount, hourly_alpha);
                if let Some(hod) = types::hour_of_day_from_bucket(&prev_bucket) {
                    profile.hour_of_day[hod].update_tps(count as f64, hourly_alpha);
                    profile.hour_of_day[hod].update_amount(amount, hourly_alpha);
                } else {
                    warn!(bucket = %prev_bucket, "could not parse hour bucket for seasonal slot update");
                }
            }
            profile.hourly.last_hour_bucket = Some(hour_bucket.clone());
        }

        // Step 5: day rollover
        let day_bucket = types::day_bucket(txn.timestamp);
        if profile.daily.last_day_bucket.as_deref() != Some(day_bucket.as_str()) {
            if let Some(prev_day) = profile.daily.last_day_bucket.clone() {
                let prev_key = keys::daily_txn_key(&profile.client_id, &prev_day);
                let count = self
                    .store
                    .add_and_get(defaults::SET_CLIENT_DAILY_COUNTERS, &prev_key, "count", 0)
                    .await?;
                let amount_paise = self
                    .store
                    .add_and_get(defaults::SET_CLIENT_DAILY_COUNTERS, &prev_key, "amount", 0)
                    .await?;
                let amount = amount_paise as f64 / 100.0;
                profile.daily.roll_amount(amount, daily_alpha);

                let new_bene_key = keys::daily_new_bene_key(&profile.client_id, &prev_day);
                let new_bene_count = self
                    .store
                    .add_and_get(defaults::SET_DAILY_NEW_BENE_CNTRS, &new_bene_key, "count", 0)
                    .await?;
                profile.daily.roll_new_bene(new_bene_count as f64, daily_alpha);

                if let Some(dow) = types::day_of_week_from_bucket(&prev_day) {
                    profile.day_of_week[dow].update_tps(count as f64, daily_alpha);
                    profile.day_of_week[dow].update_amount(amount, daily_alpha);
                } else {
                    warn!(bucket = %prev_day, "could not parse day bucket for seasonal slot update");
                }
            }
            profile.daily.last_day_bucket = Some(day_bucket.clone());
        }

        // Step 6: bump current hour/day counters
        let hourly_key = keys::hourly_txn_key(&profile.client_id, &hour_bucket);
        self.store
            .add_and_get(defaults::SET_CLIENT_HOURLY_COUNTERS, &hourly_key, "count", 1)
            .await?;
        self.store
            .add_and_get(
                defaults::SET_CLIENT_HOURLY_COUNTERS,
                &hourly_key,
                "amount",
                amount_paise,
            )
            .await?;
        let daily_key = keys::daily_txn_key(&profile.client_id, &day_bucket);
        self.store
            .add_and_get(defaults::SET_CLIENT_DAILY_COUNTERS, &daily_key, "count", 1)
            .await?;
        self.store
            .add_and_get(
                defaults::SET_CLIENT_DAILY_COUNTERS,
                &daily_key,
                "amount",
                amount_paise,
            )
            .await?;

        // Step 7: beneficiary bookkeeping
        if let Some(bene_key) = txn.beneficiary_key() {
            let is_first = profile
                .beneficiaries
                .get(&bene_key)
                .map(|s| s.txn_count == 0)
                .unwrap_or(true);
            if is_first {
                profile.distinct_beneficiary_count += 1;
                let new_bene_key = keys::daily_new_bene_key(&profile.client_id, &day_bucket);
                self.store
                    .add_and_get(defaults::SET_DAILY_NEW_BENE_CNTRS, &new_bene_key, "count", 1)
                    .await?;
            }

            let stats = profile.beneficiaries.entry(bene_key.clone()).or_default();
            stats.txn_count += 1;
            stats.amount.update(txn.amount, alpha);

            let hourly_bene_key = keys::hourly_beneficiary_key(&profile.client_id, &bene_key, &hour_bucket);
            self.store
                .add_and_get(defaults::SET_BENE_HOURLY_COUNTERS, &hourly_bene_key, "count", 1)
                .await?;
            self.store
                .add_and_get(
                    defaults::SET_BENE_HOURLY_COUNTERS,
                    &hourly_bene_key,
                    "amount",
                    amount_paise,
                )
                .await?;

            let daily_bene_key =
                keys::daily_beneficiary_amount_key(&profile.client_id, &day_bucket, &bene_key);
            self.store
                .add_and_get(
                    defaults::SET_CLIENT_DAILY_COUNTERS,
                    &daily_bene_key,
                    "amount",
                    amount_paise,
                )
                .await?;
        }

        // Step 8
        profile.last_updated = Utc::now().timestamp_millis();
        self.store
            .put(defaults::SET_CLIENT_PROFILES, &profile.client_id, profile)
            .await?;

        Ok(())
    }

    pub async fn current_hourly_count(&self, client_id: &str, ts: i64) -> Result<i64, StoreError> {
        let key = keys::hourly_txn_key(client_id, &types::hour_bucket(ts));
        self.store
            .add_and_get(defaults::SET_CLIENT_HOURLY_COUNTERS, &key, "count", 0)
            .await
    }

    pub async fn current_hourly_amount(&self, client_id: &str, ts: i64) -> Result<f64, StoreError> {
        let key = keys::hourly_txn_key(client_id, &types::hour_bucket(ts));
        let paise = self
            .store
            .add_and_get(defaults::SET_CLIENT_HOURLY_COUNTERS, &key, "amount", 0)
            .await?;
        Ok(paise as f64 / 100.0)
    }

    pub async fn current_daily_count(&self, client_id: &str, ts: i64) -> Result<i64, StoreError> {
        let key = keys::daily_txn_key(client_id, &types::day_bucket(ts));
        self.store
            .add_and_get(defaults::SET_CLIENT_DAILY_COUNTERS, &key, "count", 0)
            .await
    }

    pub async fn current_daily_amount(&self, client_id: &str, ts: i64) -> Result<f64, StoreError> {
        let key = keys::daily_txn_key(client_id, &types::day_bucket(ts));
        let paise = self
            .store
            .add_and_get(defaults::SET_CLIENT_DAILY_COUNTERS, &key, "amount", 0)
            .await?;
        Ok(paise as f64 / 100.0)
    }

    pub async fn current_daily_new_bene_count(&self, client_id: &str, ts: i64) -> Result<i64, StoreError> {
        let key = keys::daily_new_bene_key(client_id, &types::day_bucket(ts));
        self.store
            .add_and_get(defaults::SET_DAILY_NEW_BENE_CNTRS, &key, "count", 0)
            .await
    }

    pub async fn current_beneficiary_count(
        &self,
        client_id: &str,
        bene_key: &str,
        ts: i64,
    ) -> Result<i64, StoreError> {
        let key = keys::hourly_beneficiary_key(client_id, bene_key, &types::hour_bucket(ts));
        self.store
            .add_and_get(defaults::SET_BENE_HOURLY_COUNTERS, &key, "count", 0)
            .await
    }

    pub async fn current_beneficiary_amount(
        &self,
        client_id: &str,
        bene_key: &str,
        ts: i64,
    ) -> Result<f64, StoreError> {
        let key = keys::hourly_beneficiary_key(client_id, bene_key, &types::hour_bucket(ts));
        let paise = self
            .store
            .add_and_get(defaults::SET_BENE_HOURLY_COUNTERS, &key, "amount", 0)
            .await?;
        Ok(paise as f64 / 100.0)
    }

    pub async fn current_daily_beneficiary_amount(
        &self,
        client_id: &str,
        bene_key: &str,
        ts: i64,
    ) -> Result<f64, StoreError> {
        let key = keys::daily_beneficiary_amount_key(client_id, &types::day_bucket(ts), bene_key);
        let paise = self
            .store
            .add_and_get(defaults::SET_CLIENT_DAILY_COUNTERS, &key, "amount", 0)
            .await?;
        Ok(paise as f64 / 100.0)
    }
}
