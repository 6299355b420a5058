//! System-wide default constants, grouped by subsystem.

// ============================================================================
// Scoring thresholds
// ============================================================================

pub const ALERT_THRESHOLD: f64 = 30.0;
pub const BLOCK_THRESHOLD: f64 = 70.0;
pub const EWMA_ALPHA: f64 = 0.1;
pub const MIN_PROFILE_TXNS: u64 = 20;

// ============================================================================
// Rule registry
// ============================================================================

pub const RULE_CACHE_REFRESH_SECONDS: u64 = 300;

// ============================================================================
// Detector defaults
// ============================================================================

pub const MIN_TYPE_FREQUENCY_PCT: f64 = 2.0;
pub const MIN_TYPE_SAMPLES: u64 = 10;
pub const BENEFICIARY_MIN_REPEAT_COUNT: u64 = 5;
pub const BENEFICIARY_MIN_DISTINCT: u64 = 3;
pub const ABS_MIN_CONCENTRATION_PCT: f64 = 5.0;
pub const MAX_CV_PCT: f64 = 20.0;
pub const MIN_DAYS_FOR_DAILY_CUMULATIVE: u64 = 2;
pub const MAX_NEW_BENE_PER_DAY: u64 = 5;
pub const MIN_PROFILE_DAYS: u64 = 7;
pub const DORMANCY_DAYS: f64 = 30.0;
pub const DORMANCY_MINUTES: f64 = 0.0; // 0 disables the testing override
pub const MIN_SEASONAL_SAMPLES: u64 = 4;

// ============================================================================
// Mule network
// ============================================================================

pub const MULE_MIN_FAN_IN: u64 = 3;
pub const MULE_SHARED_BENE_PCT_THRESHOLD: f64 = 30.0;
pub const MULE_DENSITY_THRESHOLD: f64 = 0.5;
pub const MULE_COMPOSITE_THRESHOLD: f64 = 60.0;
pub const MULE_WEIGHT_FAN_IN: f64 = 0.4;
pub const MULE_WEIGHT_SHARED: f64 = 0.35;
pub const MULE_WEIGHT_DENSITY: f64 = 0.25;
pub const MULE_GRAPH_REFRESH_MS: u64 = 300_000;

// ============================================================================
// Isolation Forest
// ============================================================================

pub const FOREST_NUM_TREES: usize = 100;
pub const FOREST_SAMPLE_SIZE: usize = 256;
pub const FOREST_SCORE_THRESHOLD_PCT: f64 = 60.0;
pub const FOREST_MIN_TRAINING_SAMPLES: usize = 50;

// ============================================================================
// Review queue / feedback
// ============================================================================

pub const AUTO_ACCEPT_TIMEOUT_MS: i64 = 24 * 60 * 60 * 1000;
pub const AUTO_ACCEPT_CHECK_INTERVAL_SECONDS: u64 = 60;

// ============================================================================
// Auto-tuner
// ============================================================================

pub const TUNING_INTERVAL_HOURS: u64 = 6;
pub const TUNING_INITIAL_DELAY_HOURS: u64 = 1;
pub const MIN_SAMPLES_FOR_TUNING: u64 = 50;
pub const WEIGHT_FLOOR: f64 = 0.5;
pub const WEIGHT_CEILING: f64 = 5.0;
pub const MAX_ADJUSTMENT_PCT: f64 = 0.1;

// ============================================================================
// Silence detector
// ============================================================================

pub const SILENCE_CHECK_INTERVAL_MINUTES: u64 = 5;
pub const SILENCE_MIN_COMPLETED_HOURS: u64 = 48;
pub const SILENCE_MIN_EXPECTED_TPS: f64 = 0.1;
pub const SILENCE_MULTIPLIER: f64 = 3.0;

// ============================================================================
// Store
// ============================================================================

pub const STORE_TIMEOUT_SECS: u64 = 3;
pub const STORE_SOCKET_TIMEOUT_SECS: u64 = 1;

// ============================================================================
// Store set names
// ============================================================================

pub const SET_TRANSACTIONS: &str = "transactions";
pub const SET_CLIENT_PROFILES: &str = "client_profiles";
pub const SET_ANOMALY_RULES: &str = "anomaly_rules";
pub const SET_RISK_RESULTS: &str = "risk_results";
pub const SET_CLIENT_HOURLY_COUNTERS: &str = "client_hourly_counters";
pub const SET_BENE_HOURLY_COUNTERS: &str = "bene_hourly_counters";
pub const SET_CLIENT_DAILY_COUNTERS: &str = "client_daily_counters";
pub const SET_DAILY_NEW_BENE_CNTRS: &str = "daily_new_bene_cntrs";
pub const SET_IF_MODELS: &str = "if_models";
pub const SET_REVIEW_QUEUE: &str = "review_queue";
pub const SET_RULE_WEIGHT_HISTORY: &str = "rule_weight_history";
