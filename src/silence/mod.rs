//! Silence detector: periodically scans every profile for a client whose
//! transaction flow has gone quiet relative to its own learned rate,
//! something the per-transaction detectors in [`crate::detectors`] can
//! never catch because nothing triggers them when there's no transaction
//! to evaluate.
//!
//! One full store scan per tick, compared against an in-memory set of
//! already-alerted clients so the log only gets one "detected" and one
//! "resolved" event per silence episode rather than one line per tick.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::defaults;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::ClientProfile;

/// One client's computed silence state for the current tick, returned for
/// callers (tests, the demo binary) that want the numbers behind a
/// detected/resolved transition without re-deriving them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceReading {
    pub silence_minutes: f64,
    pub expected_gap_minutes: f64,
    pub tps: f64,
}

/// Whether `profile` is even eligible for a silence judgement this tick
/// and, if so, the reading.
fn evaluate_profile(profile: &ClientProfile, now: i64, min_completed_hours: u64, min_expected_tps: f64) -> Option<SilenceReading> {
    if profile.hourly.completed_hours_count < min_completed_hours {
        return None;
    }
    let tps = profile.hourly.ewma_tps;
    if tps < min_expected_tps {
        return None;
    }

    let silence_minutes = (now - profile.last_updated) as f64 / 60_000.0;
    let expected_gap_minutes = 60.0 / tps;
    Some(SilenceReading { silence_minutes, expected_gap_minutes, tps })
}

/// Holds the in-memory `alerted` set across ticks. One
/// instance is shared by the background scheduler for the lifetime of the
/// process; it is not persisted, so a restart forgets which clients were
/// already alerted and will re-emit "silence detected" for any still
/// silent at the next tick.
#[derive(Default)]
pub struct SilenceDetector {
    alerted: HashSet<String>,
}

impl SilenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One scan tick: loads every profile, computes its silence reading,
    /// and emits "silence detected" / "silence resolved" transitions
    /// against the carried-over `alerted` set. Returns the client ids
    /// newly alerted this tick, for notification dispatch.
    pub async fn tick<S: Store>(&mut self, store: &Arc<S>, notifier: &crate::notification::NotificationDispatcher, now: i64) -> Result<Vec<String>, StoreError> {
        let config = crate::config::get();
        let silence = &config.silence;
        if !silence.enabled {
            return Ok(Vec::new());
        }

        let profiles: Vec<ClientProfile> = store.scan_all(defaults::SET_CLIENT_PROFILES).await?;
        let mut still_silent = HashSet::new();
        let mut newly_alerted = Vec::new();

        for profile in &profiles {
            let Some(reading) = evaluate_profile(profile, now, silence.min_completed_hours, silence.min_expected_tps) else {
                continue;
            };
            if reading.silence_minutes > reading.expected_gap_minutes * silence.multiplier {
                still_silent.insert(profile.client_id.clone());
                if !self.alerted.contains(&profile.client_id) {
                    warn!(
                        client_id = %profile.client_id,
                        silence_minutes = reading.silence_minutes,
                        expected_gap_minutes = reading.expected_gap_minutes,
                        tps = reading.tps,
                        "silence detected"
                    );
                    notifier.notify_silent(profile.client_id.clone(), reading.silence_minutes, reading.expected_gap_minutes, reading.tps);
                    newly_alerted.push(profile.client_id.clone());
                }
            }
        }

        for client_id in self.alerted.difference(&still_silent) {
            info!(client_id = %client_id, "silence resolved");
        }
        self.alerted = still_silent;

        Ok(newly_alerted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::notification::{LoggingNotificationSink, NotificationDispatcher};
    use crate::store::MemoryStore;
    use std::sync::Arc as StdArc;

    fn profile_with(client_id: &str, completed_hours: u64, ewma_tps: f64, last_updated: i64) -> ClientProfile {
        let mut p = ClientProfile::new(client_id);
        p.hourly.completed_hours_count = completed_hours;
        p.hourly.ewma_tps = ewma_tps;
        p.last_updated = last_updated;
        p
    }

    fn dispatcher() -> NotificationDispatcher {
        NotificationDispatcher::spawn(StdArc::new(LoggingNotificationSink), 16)
    }

    #[tokio::test]
    async fn profile_below_completed_hours_is_never_judged() {
        let _ = config::init_with(config::EngineConfig::default());
        let store = StdArc::new(MemoryStore::new());
        store.put(defaults::SET_CLIENT_PROFILES, "C1", &profile_with("C1", 1, 10.0, 0)).await.unwrap();

        let mut detector = SilenceDetector::new();
        let alerted = detector.tick(&store, &dispatcher(), 10_000_000).await.unwrap();
        assert!(alerted.is_empty());
    }

    #[tokio::test]
    async fn a_quiet_client_past_its_expected_gap_is_detected_once() {
        let _ = config::init_with(config::EngineConfig::default());
        let store = StdArc::new(MemoryStore::new());
        // ewmaHourlyTps = 6/hour => expectedGap = 10 minutes; silence multiplier default 3 => threshold 30 min.
        store.put(defaults::SET_CLIENT_PROFILES, "C1", &profile_with("C1", 48, 6.0, 0)).await.unwrap();

        let notifier = dispatcher();
        let mut detector = SilenceDetector::new();
        let now = 31 * 60_000; // 31 minutes of silence
        let alerted = detector.tick(&store, &notifier, now).await.unwrap();
        assert_eq!(alerted, vec!["C1".to_string()]);

        // Second tick at the same state must not re-alert.
        let alerted_again = detector.tick(&store, &notifier, now + 1000).await.unwrap();
        assert!(alerted_again.is_empty());
    }

    #[tokio::test]
    async fn resolution_clears_the_alerted_set() {
        let _ = config::init_with(config::EngineConfig::default());
        let store = StdArc::new(MemoryStore::new());
        store.put(defaults::SET_CLIENT_PROFILES, "C1", &profile_with("C1", 48, 6.0, 0)).await.unwrap();

        let notifier = dispatcher();
        let mut detector = SilenceDetector::new();
        detector.tick(&store, &notifier, 31 * 60_000).await.unwrap();

        // Client resumes activity: last_updated catches up to "now".
        store.put(defaults::SET_CLIENT_PROFILES, "C1", &profile_with("C1", 48, 6.0, 31 * 60_000)).await.unwrap();
        let alerted = detector.tick(&store, &notifier, 31 * 60_000 + 1000).await.unwrap();
        assert!(alerted.is_empty());
        assert!(detector.alerted.is_empty());
    }
}
