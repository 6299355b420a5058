//! riskguard-engine: real-time behavioural anomaly detection for banking
//! transactions.
//!
//! A per-client profile of rolling statistics (amount EWMA/variance,
//! hourly/daily throughput, seasonal slots, beneficiary history) is kept
//! up to date as transactions arrive. Each transaction is run through a
//! configurable set of behavioural detectors — amount spikes, velocity
//! bursts, new-beneficiary risk, mule-network signals, an Isolation Forest
//! outlier score, and more — whose weighted results are combined into a
//! single composite score and a PASS/ALERT/BLOCK action. ALERT and BLOCK
//! verdicts are queued for human review; reviewer feedback feeds an
//! auto-tuner that nudges each detector's weight over time.
//!
//! ## Layout
//!
//! - [`types`] — the shared data model (`Transaction`, `ClientProfile`,
//!   `AnomalyRule`, `EvaluationResult`, ...).
//! - [`config`] — process-wide configuration, loaded once at startup.
//! - [`error`] — the typed error taxonomy returned by every fallible API.
//! - [`store`] — the `Store` persistence trait and its `sled`/in-memory
//!   backends.
//! - [`profile`] — the online profile-update service (component D).
//! - [`context`] — per-transaction counter/seasonal-slot reads (component E).
//! - [`rules`] — the live, hot-reloadable rule registry (component C).
//! - [`detectors`] — the fifteen behavioural detectors (component F).
//! - [`graph`] — the beneficiary graph for mule-network detection (component H).
//! - [`forest`] — Isolation Forest training and scoring (component G).
//! - [`scoring`] — composite score and action derivation (component I).
//! - [`queue`] — the review queue and auto-accept sweep (component K).
//! - [`tuner`] — feedback-driven rule weight tuning (component L).
//! - [`silence`] — the dormant-client detector (component M).
//! - [`notification`] — fire-and-forget BLOCK/silence notifications (component N).
//! - [`metrics`] — the counters/histograms interface (component O).
//! - [`background`] — the scheduler wiring all periodic tasks together.
//! - [`engine`] — the orchestrator (component J) tying everything together.

pub mod background;
pub mod config;
pub mod context;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod forest;
pub mod graph;
pub mod metrics;
pub mod notification;
pub mod profile;
pub mod queue;
pub mod rules;
pub mod scoring;
pub mod silence;
pub mod store;
pub mod tuner;
pub mod types;

pub use background::Scheduler;
pub use engine::{Engine, EvaluationRequest};
pub use error::{ConfigError, DetectorError, EngineError, ModelError, StoreError, TimeoutError, ValidationError};
pub use types::{
    Action, AnomalyRule, ClientProfile, EvaluationResult, FeedbackStatus, ReviewQueueItem, RiskLevel, RuleResult,
    RuleType, Transaction,
};
