//! `EngineConfig` — every operator-tunable threshold, grouped by
//! subsystem. Each section implements `Default` matching the built-in
//! constants in [`super::defaults`], so an absent or partial TOML file
//! round-trips to exactly the documented defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::defaults as d;

/// Tracks which dotted key paths were explicitly present in the user's TOML
/// file, distinguishing "user chose this value" from "serde filled in the
/// default" — useful for future hot-reload diffing.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvenance {
    pub explicit_keys: HashSet<String>,
}

impl ConfigProvenance {
    pub fn is_user_set(&self, dotted_key: &str) -> bool {
        self.explicit_keys.contains(dotted_key)
    }
}

/// Root configuration for one engine deployment.
///
/// Load with [`EngineConfig::load`], which searches, in order:
/// 1. `$RISKGUARD_CONFIG` env var (path to TOML file)
/// 2. `./engine.toml` in the current working directory
/// 3. built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub rules: RuleRegistryConfig,
    #[serde(default)]
    pub detectors: DetectorConfig,
    #[serde(default)]
    pub mule_network: MuleNetworkConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub silence: SilenceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Accepted transaction types (uppercased), extensible.
    #[serde(default = "default_txn_types")]
    pub txn_types: Vec<String>,
}

fn default_txn_types() -> Vec<String> {
    vec![
        "NEFT".into(),
        "RTGS".into(),
        "IMPS".into(),
        "UPI".into(),
        "ATM_WITHDRAWAL".into(),
        "POS".into(),
        "CASH_DEPOSIT".into(),
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            rules: RuleRegistryConfig::default(),
            detectors: DetectorConfig::default(),
            mule_network: MuleNetworkConfig::default(),
            forest: ForestConfig::default(),
            feedback: FeedbackConfig::default(),
            silence: SilenceConfig::default(),
            store: StoreConfig::default(),
            txn_types: default_txn_types(),
        }
    }
}

impl EngineConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("RISKGUARD_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "loaded engine config from RISKGUARD_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "failed to load config from RISKGUARD_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "RISKGUARD_CONFIG points to a non-existent file, falling back");
            }
        }

        let local = PathBuf::from("engine.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("loaded engine config from ./engine.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "failed to parse ./engine.toml, falling back to defaults");
                }
            }
        }

        info!("using built-in default engine config");
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        Ok(config)
    }

    pub fn accepts_txn_type(&self, txn_type: &str) -> bool {
        let upper = txn_type.to_ascii_uppercase();
        self.txn_types.iter().any(|t| *t == upper)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "d_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default = "d_block_threshold")]
    pub block_threshold: f64,
    #[serde(default = "d_ewma_alpha")]
    pub ewma_alpha: f64,
    #[serde(default = "d_min_profile_txns")]
    pub min_profile_txns: u64,
}

fn d_alert_threshold() -> f64 {
    d::ALERT_THRESHOLD
}
fn d_block_threshold() -> f64 {
    d::BLOCK_THRESHOLD
}
fn d_ewma_alpha() -> f64 {
    d::EWMA_ALPHA
}
fn d_min_profile_txns() -> u64 {
    d::MIN_PROFILE_TXNS
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alert_threshold: d::ALERT_THRESHOLD,
            block_threshold: d::BLOCK_THRESHOLD,
            ewma_alpha: d::EWMA_ALPHA,
            min_profile_txns: d::MIN_PROFILE_TXNS,
        }
    }
}

impl ScoringConfig {
    /// `hourlyAlpha = min(0.1, alpha·10)`.
    pub fn hourly_alpha(&self) -> f64 {
        (self.ewma_alpha * 10.0).min(0.1)
    }

    /// Same scaling is used for the daily alpha.
    pub fn daily_alpha(&self) -> f64 {
        self.hourly_alpha()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRegistryConfig {
    #[serde(default = "d_rule_cache_refresh")]
    pub rule_cache_refresh_seconds: u64,
}

fn d_rule_cache_refresh() -> u64 {
    d::RULE_CACHE_REFRESH_SECONDS
}

impl Default for RuleRegistryConfig {
    fn default() -> Self {
        Self {
            rule_cache_refresh_seconds: d::RULE_CACHE_REFRESH_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "d_min_type_frequency_pct")]
    pub min_type_frequency_pct: f64,
    #[serde(default = "d_min_type_samples")]
    pub min_type_samples: u64,
    #[serde(default = "d_bene_min_repeat_count")]
    pub beneficiary_min_repeat_count: u64,
    #[serde(default = "d_bene_min_distinct")]
    pub beneficiary_min_distinct: u64,
    #[serde(default = "d_abs_min_concentration_pct")]
    pub abs_min_concentration_pct: f64,
    #[serde(default = "d_max_cv_pct")]
    pub max_cv_pct: f64,
    #[serde(default = "d_min_days_daily_cumulative")]
    pub min_days_for_daily_cumulative: u64,
    #[serde(default = "d_max_new_bene_per_day")]
    pub max_new_bene_per_day: u64,
    #[serde(default = "d_min_profile_days")]
    pub min_profile_days: u64,
    #[serde(default = "d_dormancy_days")]
    pub dormancy_days: f64,
    #[serde(default = "d_dormancy_minutes")]
    pub dormancy_minutes: f64,
    #[serde(default = "d_min_seasonal_samples")]
    pub min_seasonal_samples: u64,
}

fn d_min_type_frequency_pct() -> f64 {
    d::MIN_TYPE_FREQUENCY_PCT
}
fn d_min_type_samples() -> u64 {
    d::MIN_TYPE_SAMPLES
}
fn d_bene_min_repeat_count() -> u64 {
    d::BENEFICIARY_MIN_REPEAT_COUNT
}
fn d_bene_min_distinct() -> u64 {
    d::BENEFICIARY_MIN_DISTINCT
}
fn d_abs_min_concentration_pct() -> f64 {
    d::ABS_MIN_CONCENTRATION_PCT
}
fn d_max_cv_pct() -> f64 {
    d::MAX_CV_PCT
}
fn d_min_days_daily_cumulative() -> u64 {
    d::MIN_DAYS_FOR_DAILY_CUMULATIVE
}
fn d_max_new_bene_per_day() -> u64 {
    d::MAX_NEW_BENE_PER_DAY
}
fn d_min_profile_days() -> u64 {
    d::MIN_PROFILE_DAYS
}
fn d_dormancy_days() -> f64 {
    d::DORMANCY_DAYS
}
fn d_dormancy_minutes() -> f64 {
    d::DORMANCY_MINUTES
}
fn d_min_seasonal_samples() -> u64 {
    d::MIN_SEASONAL_SAMPLES
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_type_frequency_pct: d::MIN_TYPE_FREQUENCY_PCT,
            min_type_samples: d::MIN_TYPE_SAMPLES,
            beneficiary_min_repeat_count: d::BENEFICIARY_MIN_REPEAT_COUNT,
            beneficiary_min_distinct: d::BENEFICIARY_MIN_DISTINCT,
            abs_min_concentration_pct: d::ABS_MIN_CONCENTRATION_PCT,
            max_cv_pct: d::MAX_CV_PCT,
            min_days_for_daily_cumulative: d::MIN_DAYS_FOR_DAILY_CUMULATIVE,
            max_new_bene_per_day: d::MAX_NEW_BENE_PER_DAY,
            min_profile_days: d::MIN_PROFILE_DAYS,
            dormancy_days: d::DORMANCY_DAYS,
            dormancy_minutes: d::DORMANCY_MINUTES,
            min_seasonal_samples: d::MIN_SEASONAL_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuleNetworkConfig {
    #[serde(default = "d_mule_min_fan_in")]
    pub min_fan_in: u64,
    #[serde(default = "d_mule_shared_pct")]
    pub shared_bene_pct_threshold: f64,
    #[serde(default = "d_mule_density_threshold")]
    pub density_threshold: f64,
    #[serde(default = "d_mule_composite_threshold")]
    pub composite_threshold: f64,
    #[serde(default = "d_mule_weight_fan_in")]
    pub weight_fan_in: f64,
    #[serde(default = "d_mule_weight_shared")]
    pub weight_shared: f64,
    #[serde(default = "d_mule_weight_density")]
    pub weight_density: f64,
    #[serde(default = "d_mule_graph_refresh_ms")]
    pub graph_refresh_ms: u64,
}

fn d_mule_min_fan_in() -> u64 {
    d::MULE_MIN_FAN_IN
}
fn d_mule_shared_pct() -> f64 {
    d::MULE_SHARED_BENE_PCT_THRESHOLD
}
fn d_mule_density_threshold() -> f64 {
    d::MULE_DENSITY_THRESHOLD
}
fn d_mule_composite_threshold() -> f64 {
    d::MULE_COMPOSITE_THRESHOLD
}
fn d_mule_weight_fan_in() -> f64 {
    d::MULE_WEIGHT_FAN_IN
}
fn d_mule_weight_shared() -> f64 {
    d::MULE_WEIGHT_SHARED
}
fn d_mule_weight_density() -> f64 {
    d::MULE_WEIGHT_DENSITY
}
fn d_mule_graph_refresh_ms() -> u64 {
    d::MULE_GRAPH_REFRESH_MS
}

impl Default for MuleNetworkConfig {
    fn default() -> Self {
        Self {
            min_fan_in: d::MULE_MIN_FAN_IN,
            shared_bene_pct_threshold: d::MULE_SHARED_BENE_PCT_THRESHOLD,
            density_threshold: d::MULE_DENSITY_THRESHOLD,
            composite_threshold: d::MULE_COMPOSITE_THRESHOLD,
            weight_fan_in: d::MULE_WEIGHT_FAN_IN,
            weight_shared: d::MULE_WEIGHT_SHARED,
            weight_density: d::MULE_WEIGHT_DENSITY,
            graph_refresh_ms: d::MULE_GRAPH_REFRESH_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    #[serde(default = "d_forest_num_trees")]
    pub num_trees: usize,
    #[serde(default = "d_forest_sample_size")]
    pub sample_size: usize,
    #[serde(default = "d_forest_threshold_pct")]
    pub score_threshold_pct: f64,
    #[serde(default = "d_forest_min_training_samples")]
    pub min_training_samples: usize,
}

fn d_forest_num_trees() -> usize {
    d::FOREST_NUM_TREES
}
fn d_forest_sample_size() -> usize {
    d::FOREST_SAMPLE_SIZE
}
fn d_forest_threshold_pct() -> f64 {
    d::FOREST_SCORE_THRESHOLD_PCT
}
fn d_forest_min_training_samples() -> usize {
    d::FOREST_MIN_TRAINING_SAMPLES
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: d::FOREST_NUM_TREES,
            sample_size: d::FOREST_SAMPLE_SIZE,
            score_threshold_pct: d::FOREST_SCORE_THRESHOLD_PCT,
            min_training_samples: d::FOREST_MIN_TRAINING_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "d_auto_accept_timeout_ms")]
    pub auto_accept_timeout_ms: i64,
    #[serde(default = "d_auto_accept_check_interval_seconds")]
    pub auto_accept_check_interval_seconds: u64,
    #[serde(default = "d_tuning_interval_hours")]
    pub tuning_interval_hours: u64,
    #[serde(default = "d_tuning_initial_delay_hours")]
    pub tuning_initial_delay_hours: u64,
    #[serde(default = "d_min_samples_for_tuning")]
    pub min_samples_for_tuning: u64,
    #[serde(default = "d_weight_floor")]
    pub weight_floor: f64,
    #[serde(default = "d_weight_ceiling")]
    pub weight_ceiling: f64,
    #[serde(default = "d_max_adjustment_pct")]
    pub max_adjustment_pct: f64,
}

fn d_auto_accept_timeout_ms() -> i64 {
    d::AUTO_ACCEPT_TIMEOUT_MS
}
fn d_auto_accept_check_interval_seconds() -> u64 {
    d::AUTO_ACCEPT_CHECK_INTERVAL_SECONDS
}
fn d_tuning_interval_hours() -> u64 {
    d::TUNING_INTERVAL_HOURS
}
fn d_tuning_initial_delay_hours() -> u64 {
    d::TUNING_INITIAL_DELAY_HOURS
}
fn d_min_samples_for_tuning() -> u64 {
    d::MIN_SAMPLES_FOR_TUNING
}
fn d_weight_floor() -> f64 {
    d::WEIGHT_FLOOR
}
fn d_weight_ceiling() -> f64 {
    d::WEIGHT_CEILING
}
fn d_max_adjustment_pct() -> f64 {
    d::MAX_ADJUSTMENT_PCT
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            auto_accept_timeout_ms: d::AUTO_ACCEPT_TIMEOUT_MS,
            auto_accept_check_interval_seconds: d::AUTO_ACCEPT_CHECK_INTERVAL_SECONDS,
            tuning_interval_hours: d::TUNING_INTERVAL_HOURS,
            tuning_initial_delay_hours: d::TUNING_INITIAL_DELAY_HOURS,
            min_samples_for_tuning: d::MIN_SAMPLES_FOR_TUNING,
            weight_floor: d::WEIGHT_FLOOR,
            weight_ceiling: d::WEIGHT_CEILING,
            max_adjustment_pct: d::MAX_ADJUSTMENT_PCT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilenceConfig {
    #[serde(default = "d_silence_enabled")]
    pub enabled: bool,
    #[serde(default = "d_silence_check_interval_minutes")]
    pub check_interval_minutes: u64,
    #[serde(default = "d_silence_multiplier")]
    pub multiplier: f64,
    #[serde(default = "d_silence_min_expected_tps")]
    pub min_expected_tps: f64,
    #[serde(default = "d_silence_min_completed_hours")]
    pub min_completed_hours: u64,
}

fn d_silence_enabled() -> bool {
    true
}
fn d_silence_check_interval_minutes() -> u64 {
    d::SILENCE_CHECK_INTERVAL_MINUTES
}
fn d_silence_multiplier() -> f64 {
    d::SILENCE_MULTIPLIER
}
fn d_silence_min_expected_tps() -> f64 {
    d::SILENCE_MIN_EXPECTED_TPS
}
fn d_silence_min_completed_hours() -> u64 {
    d::SILENCE_MIN_COMPLETED_HOURS
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_minutes: d::SILENCE_CHECK_INTERVAL_MINUTES,
            multiplier: d::SILENCE_MULTIPLIER,
            min_expected_tps: d::SILENCE_MIN_EXPECTED_TPS,
            min_completed_hours: d::SILENCE_MIN_COMPLETED_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "d_store_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "d_store_socket_timeout_secs")]
    pub socket_timeout_secs: u64,
    /// Filesystem path for the sled-backed store; ignored by the in-memory
    /// backend used in tests and the demo binary.
    #[serde(default = "d_store_path")]
    pub path: String,
}

fn d_store_timeout_secs() -> u64 {
    d::STORE_TIMEOUT_SECS
}
fn d_store_socket_timeout_secs() -> u64 {
    d::STORE_SOCKET_TIMEOUT_SECS
}
fn d_store_path() -> String {
    "./riskguard-data".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_secs: d::STORE_TIMEOUT_SECS,
            socket_timeout_secs: d::STORE_SOCKET_TIMEOUT_SECS,
            path: d_store_path(),
        }
    }
}
