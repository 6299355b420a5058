//! Inbound transaction shape and the canonical beneficiary key.

use serde::{Deserialize, Serialize};

/// A single immutable transaction as submitted to the engine.
///
/// Amounts arrive in rupees, matching the external request shape;
/// internally the profile/counters layers convert to paise (integer
/// minor units) on write paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub txn_id: String,
    pub client_id: String,
    pub txn_type: String,
    /// Amount in rupees, non-negative.
    pub amount: f64,
    /// Epoch milliseconds, UTC.
    pub timestamp: i64,
    pub beneficiary_ifsc: Option<String>,
    pub beneficiary_account: Option<String>,
}

impl Transaction {
    /// Integer minor units ("paise") for counter writes.
    pub fn amount_paise(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }

    /// Canonical beneficiary key: `ifsc:account`, `UNKNOWN:account` when the
    /// IFSC is missing, or `None` when the account itself is absent.
    pub fn beneficiary_key(&self) -> Option<String> {
        let account = self.beneficiary_account.as_ref()?;
        if account.is_empty() {
            return None;
        }
        let ifsc = self
            .beneficiary_ifsc
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("UNKNOWN");
        Some(format!("{ifsc}:{account}"))
    }
}
