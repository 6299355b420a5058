//! Rule registry: an `ArcSwap`-published immutable snapshot of enabled
//! detectors, refreshed on a fixed cadence by [`crate::background`].
//! `arc-swap` gives lock-free atomic snapshot swaps for hot reload — the
//! same pattern used separately for the beneficiary graph in
//! [`crate::graph`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::config::defaults;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::AnomalyRule;

/// An immutable point-in-time view of all enabled rules.
pub struct RuleSnapshot {
    pub rules: Vec<AnomalyRule>,
}

impl RuleSnapshot {
    fn from_all(all: Vec<AnomalyRule>) -> Self {
        Self {
            rules: all.into_iter().filter(|r| r.enabled).collect(),
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }
}

/// Caches all rules in memory, publishing a fresh [`RuleSnapshot`] on every
/// reload or CRUD write. Readers never lock.
pub struct RuleRegistry<S: Store> {
    store: Arc<S>,
    snapshot: ArcSwap<RuleSnapshot>,
}

impl<S: Store> RuleRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            snapshot: ArcSwap::from_pointee(RuleSnapshot::empty()),
        }
    }

    /// Rebuilds the snapshot from the store. Called at startup and on the
    /// periodic reload cadence (`ruleCacheRefreshSeconds`).
    pub async fn reload(&self) -> Result<(), StoreError> {
        let all: Vec<AnomalyRule> = self.store.scan_all(defaults::SET_ANOMALY_RULES).await?;
        let count = all.len();
        self.snapshot.store(Arc::new(RuleSnapshot::from_all(all)));
        debug!(rule_count = count, "rule registry reloaded");
        Ok(())
    }

    /// The current enabled-rules snapshot. Lock-free.
    pub fn active_rules(&self) -> Arc<RuleSnapshot> {
        self.snapshot.load_full()
    }

    /// Persist a rule and refresh the snapshot immediately.
    pub async fn save(&self, rule: &AnomalyRule) -> Result<(), StoreError> {
        self.store
            .put(defaults::SET_ANOMALY_RULES, &rule.rule_id, rule)
            .await?;
        self.reload().await?;
        info!(rule_id = %rule.rule_id, "rule saved");
        Ok(())
    }

    pub async fn delete(&self, rule_id: &str) -> Result<(), StoreError> {
        self.store.delete(defaults::SET_ANOMALY_RULES, rule_id).await?;
        self.reload().await?;
        info!(rule_id, "rule deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::RuleType;

    fn rule(id: &str, rule_type: RuleType, enabled: bool) -> AnomalyRule {
        let mut r = AnomalyRule::new(id, id, rule_type);
        r.enabled = enabled;
        r
    }

    #[tokio::test]
    async fn reload_filters_disabled_rules() {
        let store = Arc::new(MemoryStore::new());
        let registry = RuleRegistry::new(store.clone());
        registry.save(&rule("R1", RuleType::AmountAnomaly, true)).await.unwrap();
        registry.save(&rule("R2", RuleType::TpsSpike, false)).await.unwrap();

        let active = registry.active_rules();
        assert_eq!(active.rules.len(), 1);
        assert_eq!(active.rules[0].rule_id, "R1");
    }

    #[tokio::test]
    async fn delete_refreshes_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let registry = RuleRegistry::new(store.clone());
        registry.save(&rule("R1", RuleType::AmountAnomaly, true)).await.unwrap();
        assert_eq!(registry.active_rules().rules.len(), 1);

        registry.delete("R1").await.unwrap();
        assert_eq!(registry.active_rules().rules.len(), 0);
    }

    #[tokio::test]
    async fn snapshot_is_empty_before_first_reload() {
        let store = Arc::new(MemoryStore::new());
        let registry = RuleRegistry::new(store);
        assert_eq!(registry.active_rules().rules.len(), 0);
    }
}
