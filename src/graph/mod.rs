//! Beneficiary graph: an in-memory bipartite
//! {client} ∪ {beneficiary key} graph, rebuilt periodically from a full
//! transaction scan into an immutable snapshot published through
//! `ArcSwap`, the same lock-free-hot-read pattern used for the rule
//! registry.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::config::defaults;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::Transaction;

/// An immutable point-in-time view of the beneficiary graph.
#[derive(Debug, Default)]
pub struct GraphSnapshot {
    bene_to_clients: HashMap<String, HashSet<String>>,
    client_to_benes: HashMap<String, HashSet<String>>,
}

impl GraphSnapshot {
    pub(crate) fn build(transactions: &[Transaction]) -> Self {
        let mut bene_to_clients: HashMap<String, HashSet<String>> = HashMap::new();
        let mut client_to_benes: HashMap<String, HashSet<String>> = HashMap::new();

        for txn in transactions {
            if let Some(bene_key) = txn.beneficiary_key() {
                bene_to_clients
                    .entry(bene_key.clone())
                    .or_default()
                    .insert(txn.client_id.clone());
                client_to_benes
                    .entry(txn.client_id.clone())
                    .or_default()
                    .insert(bene_key);
            }
        }

        Self {
            bene_to_clients,
            client_to_benes,
        }
    }

    /// Number of distinct clients that have sent to `bene_key`.
    pub fn fan_in_count(&self, bene_key: &str) -> usize {
        self.bene_to_clients.get(bene_key).map(HashSet::len).unwrap_or(0)
    }

    /// Clients that have sent to `bene_key`, excluding `except_client`.
    pub fn other_senders(&self, bene_key: &str, except_client: &str) -> HashSet<String> {
        self.bene_to_clients
            .get(bene_key)
            .map(|clients| {
                clients
                    .iter()
                    .filter(|c| c.as_str() != except_client)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn total_beneficiary_count(&self, client_id: &str) -> usize {
        self.client_to_benes.get(client_id).map(HashSet::len).unwrap_or(0)
    }

    /// Beneficiaries of `client_id` with `fanIn > 1`.
    pub fn shared_beneficiary_count(&self, client_id: &str) -> usize {
        let Some(benes) = self.client_to_benes.get(client_id) else {
            return 0;
        };
        benes.iter().filter(|b| self.fan_in_count(b) > 1).count()
    }

    /// Other clients sharing at least one beneficiary with `client_id`.
    fn neighbours(&self, client_id: &str) -> HashSet<String> {
        let Some(benes) = self.client_to_benes.get(client_id) else {
            return HashSet::new();
        };
        let mut out = HashSet::new();
        for bene in benes {
            if let Some(senders) = self.bene_to_clients.get(bene) {
                for sender in senders {
                    if sender != client_id {
                        out.insert(sender.clone());
                    }
                }
            }
        }
        out
    }

    /// Whether two clients share at least one beneficiary.
    fn shares_any_beneficiary(&self, a: &str, b: &str) -> bool {
        let (Some(a_benes), Some(b_benes)) = (self.client_to_benes.get(a), self.client_to_benes.get(b))
        else {
            return false;
        };
        a_benes.intersection(b_benes).next().is_some()
    }

    /// Clustering coefficient of `client_id`'s neighbourhood: the fraction
    /// of possible edges between neighbour pairs that actually exist,
    /// clipped to `[0,1]`, 0 when the neighbour count is below 2.
    pub fn network_density(&self, client_id: &str) -> f64 {
        let neighbours: Vec<String> = self.neighbours(client_id).into_iter().collect();
        let n = neighbours.len();
        if n < 2 {
            return 0.0;
        }

        let mut actual_edges = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.shares_any_beneficiary(&neighbours[i], &neighbours[j]) {
                    actual_edges += 1;
                }
            }
        }
        let max_possible = (n * (n - 1)) / 2;
        (actual_edges as f64 / max_possible as f64).clamp(0.0, 1.0)
    }
}

/// Owns the published [`GraphSnapshot`] and the store access needed to
/// rebuild it.
pub struct BeneficiaryGraph<S: Store> {
    store: Arc<S>,
    snapshot: ArcSwap<GraphSnapshot>,
    ready: AtomicBool,
}

impl<S: Store> BeneficiaryGraph<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            snapshot: ArcSwap::from_pointee(GraphSnapshot::default()),
            ready: AtomicBool::new(false),
        }
    }

    /// Rebuilds the graph from a full transaction scan.
    pub async fn rebuild(&self) -> Result<(), StoreError> {
        let transactions: Vec<Transaction> = self.store.scan_all(defaults::SET_TRANSACTIONS).await?;
        let count = transactions.len();
        self.snapshot.store(Arc::new(GraphSnapshot::build(&transactions)));
        self.ready.store(true, Ordering::Release);
        debug!(transaction_count = count, "beneficiary graph rebuilt");
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.snapshot.load_full()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(client: &str, account: &str) -> Transaction {
        Transaction {
            txn_id: format!("{client}-{account}"),
            client_id: client.into(),
            txn_type: "NEFT".into(),
            amount: 100.0,
            timestamp: 0,
            beneficiary_ifsc: Some("HDFC0009999".into()),
            beneficiary_account: Some(account.into()),
        }
    }

    #[test]
    fn fan_in_counts_distinct_senders() {
        let snapshot = GraphSnapshot::build(&[txn("A", "1"), txn("B", "1"), txn("C", "1")]);
        assert_eq!(snapshot.fan_in_count("HDFC0009999:1"), 3);
    }

    #[test]
    fn other_senders_excludes_self() {
        let snapshot = GraphSnapshot::build(&[txn("A", "1"), txn("B", "1")]);
        let others = snapshot.other_senders("HDFC0009999:1", "A");
        assert_eq!(others.len(), 1);
        assert!(others.contains("B"));
    }

    #[test]
    fn shared_beneficiary_count_requires_fan_in_above_one() {
        let snapshot = GraphSnapshot::build(&[txn("A", "1"), txn("A", "2"), txn("B", "1")]);
        // A has beneficiaries {1,2}; only "1" has fan-in > 1.
        assert_eq!(snapshot.shared_beneficiary_count("A"), 1);
    }

    #[test]
    fn density_is_zero_below_two_neighbours() {
        let snapshot = GraphSnapshot::build(&[txn("A", "1"), txn("B", "1")]);
        assert_eq!(snapshot.network_density("A"), 0.0);
    }

    #[test]
    fn density_reflects_neighbour_interconnection() {
        // A shares bene 1 with B and C. B and C also share bene 2 with each other.
        let snapshot = GraphSnapshot::build(&[
            txn("A", "1"),
            txn("B", "1"),
            txn("C", "1"),
            txn("B", "2"),
            txn("C", "2"),
        ]);
        // neighbours(A) = {B, C}; B and C share bene "2" => 1 edge out of C(2,2)=1 possible.
        assert_eq!(snapshot.network_density("A"), 1.0);
    }

    #[test]
    fn density_is_partial_when_only_some_neighbour_pairs_connect() {
        // A shares with B, C, D. Only B-C are interconnected via another beneficiary.
        let snapshot = GraphSnapshot::build(&[
            txn("A", "1"),
            txn("B", "1"),
            txn("C", "1"),
            txn("D", "1"),
            txn("B", "2"),
            txn("C", "2"),
        ]);
        // neighbours = {B,C,D}, possible pairs = 3, only (B,C) connected => 1/3
        let density = snapshot.network_density("A");
        assert!((density - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn graph_becomes_ready_after_first_rebuild() {
        use crate::store::MemoryStore;
        let store = Arc::new(MemoryStore::new());
        let graph = BeneficiaryGraph::new(store);
        assert!(!graph.is_ready());
        graph.rebuild().await.unwrap();
        assert!(graph.is_ready());
    }
}
