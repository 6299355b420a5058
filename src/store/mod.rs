//! Persistence layer. One [`Store`] trait, two backends: [`SledStore`]
//! for production (one sled tree per named record set) and [`MemoryStore`]
//! for tests and the demo binary (built over `dashmap` for concurrent
//! access without an external lock).
//!
//! Every record set is a flat `key -> JSON value` map addressed by one of
//! the `SET_*` names in [`crate::config::defaults`]; this mirrors the
//! record catalogue directly rather than modelling relations.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;

/// Uniform key-value persistence contract. Async because any call may
/// suspend on I/O, so the in-memory backend can sit behind the same
/// interface as the disk-backed one without the orchestrator caring which.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or overwrite `key` in `set` with `value`'s JSON encoding.
    async fn put<T: Serialize + Send + Sync>(
        &self,
        set: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError>;

    /// Fetch and decode the value stored at `set`/`key`, if any.
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        set: &str,
        key: &str,
    ) -> Result<Option<T>, StoreError>;

    async fn delete(&self, set: &str, key: &str) -> Result<(), StoreError>;

    /// Decode every value in `set`. Order is backend-defined; callers that
    /// need an order sort client-side.
    async fn scan_all<T: DeserializeOwned + Send + Sync>(
        &self,
        set: &str,
    ) -> Result<Vec<T>, StoreError>;

    /// Atomically increment the `i64` counter at `set`/`key`/`field` by
    /// `delta` and return the post-increment value. A
    /// counter record like the hourly bucket's `{count, totalAmount}` is
    /// two independent fields under the same logical key, each
    /// linearizable on its own — concurrent transactions on the same
    /// client never lose an increment to either field.
    async fn add_and_get(
        &self,
        set: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError>;
}

#[cfg(test)]
/// Shared behavioural contract both backends must satisfy. Each backend's
/// own test module calls these against its own instance, so a regression in
/// either one's semantics is caught without duplicating assertions.
pub(crate) mod contract {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
    pub struct Record {
        pub value: String,
    }

    pub async fn put_then_get_round_trips<S: Store>(store: &S) {
        let record = Record {
            value: "hello".to_string(),
        };
        store.put("widgets", "a", &record).await.unwrap();
        let fetched: Option<Record> = store.get("widgets", "a").await.unwrap();
        assert_eq!(fetched, Some(record));
    }

    pub async fn get_missing_key_is_none<S: Store>(store: &S) {
        let fetched: Option<Record> = store.get("widgets", "missing").await.unwrap();
        assert_eq!(fetched, None);
    }

    pub async fn delete_removes_key<S: Store>(store: &S) {
        let record = Record {
            value: "bye".to_string(),
        };
        store.put("widgets", "b", &record).await.unwrap();
        store.delete("widgets", "b").await.unwrap();
        let fetched: Option<Record> = store.get("widgets", "b").await.unwrap();
        assert_eq!(fetched, None);
    }

    pub async fn scan_all_returns_every_value<S: Store>(store: &S) {
        store
            .put("scan_set", "1", &Record { value: "one".into() })
            .await
            .unwrap();
        store
            .put("scan_set", "2", &Record { value: "two".into() })
            .await
            .unwrap();
        let all: Vec<Record> = store.scan_all("scan_set").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    pub async fn add_and_get_accumulates<S: Store>(store: &S) {
        let first = store.add_and_get("counters", "c1", "count", 1).await.unwrap();
        let second = store.add_and_get("counters", "c1", "count", 1).await.unwrap();
        let third = store.add_and_get("counters", "c1", "count", 5).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 7);
    }

    pub async fn add_and_get_is_independent_per_key<S: Store>(store: &S) {
        store.add_and_get("counters", "x", "count", 3).await.unwrap();
        store.add_and_get("counters", "y", "count", 4).await.unwrap();
        let x: i64 = store.add_and_get("counters", "x", "count", 0).await.unwrap();
        let y: i64 = store.add_and_get("counters", "y", "count", 0).await.unwrap();
        assert_eq!(x, 3);
        assert_eq!(y, 4);
    }

    pub async fn add_and_get_is_independent_per_field<S: Store>(store: &S) {
        store.add_and_get("counters", "z", "count", 3).await.unwrap();
        store.add_and_get("counters", "z", "amount", 700).await.unwrap();
        let count: i64 = store.add_and_get("counters", "z", "count", 0).await.unwrap();
        let amount: i64 = store.add_and_get("counters", "z", "amount", 0).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(amount, 700);
    }
}
