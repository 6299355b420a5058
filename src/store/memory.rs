//! In-memory backend for tests and the demo binary, built over `dashmap`
//! so sets can be read and written concurrently without a single coarse
//! `RwLock` per store.

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

use super::Store;

#[derive(Default)]
pub struct MemoryStore {
    sets: DashMap<String, DashMap<String, serde_json::Value>>,
    counters: DashMap<(String, String), Arc<AtomicI64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, name: &str) -> dashmap::mapref::one::RefMut<'_, String, DashMap<String, serde_json::Value>> {
        self.sets.entry(name.to_string()).or_insert_with(DashMap::new)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put<T: Serialize + Send + Sync>(
        &self,
        set: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_value(value)?;
        self.set(set).insert(key.to_string(), json);
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        set: &str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.set(set).get(key) {
            Some(entry) => {
                let value = serde_json::from_value(entry.value().clone())?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, set: &str, key: &str) -> Result<(), StoreError> {
        self.set(set).remove(key);
        Ok(())
    }

    async fn scan_all<T: DeserializeOwned + Send + Sync>(
        &self,
        set: &str,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for entry in self.set(set).iter() {
            out.push(serde_json::from_value(entry.value().clone())?);
        }
        Ok(out)
    }

    async fn add_and_get(
        &self,
        set: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let counter_key = (set.to_string(), format!("{key}\u{0}{field}"));
        let counter = self
            .counters
            .entry(counter_key)
            .or_insert_with(|| Arc::new(AtomicI64::new(0)))
            .clone();
        Ok(counter.fetch_add(delta, Ordering::SeqCst) + delta)
    }
}
