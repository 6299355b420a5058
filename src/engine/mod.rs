//! Orchestrator: sequences profile load, context build, detector fan-out,
//! scoring, profile update, persistence, queue enqueue, and notification
//! dispatch for one transaction.
//!
//! `Engine` owns every subsystem handle behind one `evaluate`-shaped entry
//! point, with the per-transaction control flow read as a literal method
//! body rather than a multi-phase struct.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{self, defaults};
use crate::context::EvaluationContext;
use crate::detectors::{DetectorInput, DetectorRegistry};
use crate::error::{EngineError, StoreError, TimeoutError, ValidationError};
use crate::forest;
use crate::graph::BeneficiaryGraph;
use crate::notification::NotificationDispatcher;
use crate::profile::ProfileService;
use crate::queue::ReviewQueue;
use crate::rules::RuleRegistry;
use crate::scoring;
use crate::store::Store;
use crate::types::{Action, EvaluationResult, ReviewQueueItem, RuleResult, Transaction};

/// One evaluation request. `deadline` is the end-to-end timeout budget;
/// `None` means no timeout is enforced (used by the demo binary and tests).
pub struct EvaluationRequest {
    pub txn: Transaction,
    pub deadline: Option<Duration>,
}

impl EvaluationRequest {
    pub fn new(txn: Transaction) -> Self {
        Self { txn, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Validates a transaction before any side effect occurs.
fn validate(txn: &Transaction) -> Result<(), ValidationError> {
    if txn.txn_id.is_empty() {
        return Err(ValidationError::MissingField("txnId"));
    }
    if txn.client_id.is_empty() {
        return Err(ValidationError::MissingField("clientId"));
    }
    if txn.amount < 0.0 {
        return Err(ValidationError::NegativeAmount(txn.amount));
    }
    if !config::get().accepts_txn_type(&txn.txn_type) {
        return Err(ValidationError::UnknownTxnType(txn.txn_type.clone()));
    }
    Ok(())
}

/// Owns every subsystem handle needed to evaluate one transaction
/// end-to-end. Cheap to clone (every field is an `Arc`), so it can be
/// handed to the API surface and the background scheduler alike.
pub struct Engine<S: Store> {
    store: Arc<S>,
    profiles: ProfileService<S>,
    rules: Arc<RuleRegistry<S>>,
    detectors: Arc<DetectorRegistry>,
    graph: Arc<BeneficiaryGraph<S>>,
    queue: Arc<ReviewQueue<S>>,
    notifier: NotificationDispatcher,
}

impl<S: Store> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            profiles: self.profiles.clone(),
            rules: self.rules.clone(),
            detectors: self.detectors.clone(),
            graph: self.graph.clone(),
            queue: self.queue.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S: Store> Engine<S> {
    pub fn new(
        store: Arc<S>,
        rules: Arc<RuleRegistry<S>>,
        graph: Arc<BeneficiaryGraph<S>>,
        queue: Arc<ReviewQueue<S>>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            profiles: ProfileService::new(store.clone()),
            detectors: Arc::new(DetectorRegistry::new()),
            store,
            rules,
            graph,
            queue,
            notifier,
        }
    }

    /// Evaluates one transaction, enforcing `request.deadline` if set
    /// On timeout, nothing is enqueued and the profile is not
    /// updated, but the underlying store writes already issued before the
    /// deadline fired are not rolled back — no transactional guarantee is
    /// made across the two.
    pub async fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResult, EngineError> {
        let txn_id = request.txn.txn_id.clone();
        let body = self.evaluate_inner(request.txn);
        match request.deadline {
            Some(deadline) => tokio::time::timeout(deadline, body)
                .await
                .unwrap_or_else(|_| Err(EngineError::Timeout(TimeoutError(txn_id)))),
            None => body.await,
        }
    }

    async fn evaluate_inner(&self, txn: Transaction) -> Result<EvaluationResult, EngineError> {
        validate(&txn)?;

        // D: load the pre-update profile.
        let mut profile = self.profiles.get_or_create(&txn.client_id).await?;
        let config = config::get();
        let now = Utc::now().timestamp_millis();

        // Every transaction is recorded in full regardless of verdict, so
        // the beneficiary graph's periodic full-scan rebuild (component H)
        // has a complete history to build edges from.
        self.store.put(defaults::SET_TRANSACTIONS, &txn.txn_id, &txn).await?;

        // Grace window: too little history to evaluate against.
        if profile.total_txn_count < config.scoring.min_profile_txns {
            self.profiles.update(&mut profile, &txn).await?;
            let result = EvaluationResult {
                txn_id: txn.txn_id.clone(),
                client_id: txn.client_id.clone(),
                composite_score: 0.0,
                risk_level: crate::types::RiskLevel::from_score(0.0),
                action: Action::Pass,
                rule_results: Vec::new(),
                evaluated_at: now,
            };
            self.persist_result(&result).await?;
            return Ok(result);
        }

        // E: read live counters and seasonal slots for this transaction.
        let context = EvaluationContext::build(&self.profiles, &profile, &txn).await?;

        // F: run every enabled detector (registry C, graph H, forest G as needed).
        let snapshot = self.rules.active_rules();
        let graph_snapshot = self.graph.snapshot();
        let graph_ref = if self.graph.is_ready() { Some(graph_snapshot.as_ref()) } else { None };
        let forest_model = if snapshot.rules.iter().any(|r| r.rule_type == crate::types::RuleType::IsolationForest) {
            forest::load(self.store.as_ref(), &txn.client_id).await?
        } else {
            None
        };

        let rule_results: Vec<RuleResult> = snapshot
            .rules
            .iter()
            .map(|rule| {
                let mut input = DetectorInput::new(&txn, &profile, rule, &context);
                if let Some(g) = graph_ref {
                    input = input.with_graph(g);
                }
                if let Some(ref model) = forest_model {
                    input = input.with_forest_model(model);
                }
                self.detectors.evaluate(&input)
            })
            .collect();

        // I: score.
        let (composite_score, risk_level, action) = scoring::score(&rule_results);

        // D: update the profile with this transaction now that detectors
        // have consumed the pre-update snapshot.
        self.profiles.update(&mut profile, &txn).await?;

        let result = EvaluationResult {
            txn_id: txn.txn_id.clone(),
            client_id: txn.client_id.clone(),
            composite_score,
            risk_level,
            action,
            rule_results,
            evaluated_at: now,
        };

        // B: persist the verdict.
        self.persist_result(&result).await?;

        // K: enqueue ALERT/BLOCK for human review.
        if matches!(result.action, Action::Alert | Action::Block) {
            self.enqueue_for_review(&result).await?;
        }

        // N: fire-and-forget BLOCK notification. Never blocks the caller.
        if result.action == Action::Block {
            self.notifier.notify_blocked(txn.clone(), result.clone());
        }

        Ok(result)
    }

    async fn persist_result(&self, result: &EvaluationResult) -> Result<(), StoreError> {
        self.store.put(defaults::SET_RISK_RESULTS, &result.txn_id, result).await
    }

    /// Enqueues a review item, retrying the store write up to 3 times
    /// before surfacing a non-fatal warning.
    async fn enqueue_for_review(&self, result: &EvaluationResult) -> Result<(), StoreError> {
        let config = config::get();
        let triggered_rule_ids: Vec<String> =
            result.rule_results.iter().filter(|r| r.triggered).map(|r| r.rule_id.clone()).collect();
        let item = ReviewQueueItem::new(
            result.txn_id.clone(),
            result.client_id.clone(),
            result.action,
            result.composite_score,
            result.risk_level,
            triggered_rule_ids,
            result.evaluated_at,
            config.feedback.auto_accept_timeout_ms,
        );

        let mut last_err = None;
        for attempt in 1..=3 {
            match self.queue.save(&item).await {
                Ok(()) => {
                    info!(txn_id = %item.txn_id, action = ?item.action, "review item enqueued");
                    return Ok(());
                }
                Err(e) => {
                    warn!(txn_id = %item.txn_id, attempt, error = %e, "review queue write failed, retrying");
                    last_err = Some(e);
                }
            }
        }
        let err = last_err.expect("loop runs at least once");
        warn!(txn_id = %item.txn_id, error = %err, "review queue write exhausted retries");
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::LoggingNotificationSink;
    use crate::store::MemoryStore;
    use crate::types::{AnomalyRule, RuleType};

    fn txn(txn_id: &str, client_id: &str, amount: f64) -> Transaction {
        Transaction {
            txn_id: txn_id.into(),
            client_id: client_id.into(),
            txn_type: "NEFT".into(),
            amount,
            timestamp: 1_700_000_000_000,
            beneficiary_ifsc: None,
            beneficiary_account: None,
        }
    }

    async fn engine() -> Engine<MemoryStore> {
        let _ = config::init_with(config::EngineConfig::default());
        let store = Arc::new(MemoryStore::new());
        let rules = Arc::new(RuleRegistry::new(store.clone()));
        rules
            .save(&AnomalyRule::new("R1", "amount anomaly", RuleType::AmountAnomaly).with_variance_pct(20.0))
            .await
            .unwrap();
        let graph = Arc::new(BeneficiaryGraph::new(store.clone()));
        let queue = Arc::new(ReviewQueue::new(store.clone()));
        let notifier = NotificationDispatcher::spawn(Arc::new(LoggingNotificationSink), 16);
        Engine::new(store, rules, graph, queue, notifier)
    }

    #[tokio::test]
    async fn invalid_transaction_is_rejected_before_any_side_effect() {
        let engine = engine().await;
        let mut t = txn("T1", "C1", -5.0);
        t.txn_type = "BITCOIN".into();
        let err = engine.evaluate(EvaluationRequest::new(t)).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn grace_window_passes_without_running_detectors() {
        let engine = engine().await;
        let result = engine.evaluate(EvaluationRequest::new(txn("T1", "C1", 100.0))).await.unwrap();
        assert_eq!(result.action, Action::Pass);
        assert!(result.rule_results.is_empty());
    }

    #[tokio::test]
    async fn established_profile_runs_detectors_and_enqueues_on_alert() {
        let engine = engine().await;
        for i in 0..25 {
            engine.evaluate(EvaluationRequest::new(txn(&format!("warmup-{i}"), "C1", 100.0))).await.unwrap();
        }

        let spike = engine.evaluate(EvaluationRequest::new(txn("SPIKE", "C1", 100_000.0))).await.unwrap();
        assert!(!spike.rule_results.is_empty());
        if matches!(spike.action, Action::Alert | Action::Block) {
            let queued = engine.queue.find_by_txn_id("SPIKE").await.unwrap();
            assert!(queued.is_some());
        }
    }

    #[tokio::test]
    async fn a_very_short_deadline_times_out() {
        let engine = engine().await;
        let request = EvaluationRequest::new(txn("T1", "C1", 100.0)).with_deadline(Duration::from_nanos(1));
        let result = engine.evaluate(request).await;
        assert!(matches!(result, Err(EngineError::Timeout(_))));
    }
}
