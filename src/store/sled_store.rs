//! Sled-backed production store. One tree per record set, opened lazily
//! behind an `Arc<sled::Db>` and addressed by the `SET_*` name constants
//! so the on-disk layout matches the record catalogue one-to-one.
//!
//! Sled's own `Tree::fetch_and_update` gives us a linearizable per-key
//! counter without a separate lock, which is exactly what the hourly/daily
//! transaction counters need under concurrent writers.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::StoreError;

use super::Store;

#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn tree(&self, set: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(set)?)
    }
}

#[async_trait]
impl Store for SledStore {
    async fn put<T: Serialize + Send + Sync>(
        &self,
        set: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let tree = self.tree(set)?;
        let bytes = serde_json::to_vec(value)?;
        tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        set: &str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let tree = self.tree(set)?;
        match tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, set: &str, key: &str) -> Result<(), StoreError> {
        let tree = self.tree(set)?;
        tree.remove(key.as_bytes())?;
        Ok(())
    }

    async fn scan_all<T: DeserializeOwned + Send + Sync>(
        &self,
        set: &str,
    ) -> Result<Vec<T>, StoreError> {
        let tree = self.tree(set)?;
        let mut out = Vec::new();
        for item in tree.iter() {
            let (_key, value) = item?;
            match serde_json::from_slice::<T>(&value) {
                Ok(record) => out.push(record),
                Err(e) => {
                    debug!(set, error = %e, "skipping corrupt record during scan");
                }
            }
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
        let tree = self.tree(set)?;
        let counter_key = format!("{key}\u{0}{field}");
        let new_value = tree.fetch_and_update(counter_key.as_bytes(), move |old| {
            let current = old
                .and_then(|bytes| bytes.try_into().ok())
                .map(i64::from_be_bytes)
                .unwrap_or(0);
            Some((current + delta).to_be_bytes().to_vec())
        })?;
        let previous = new_value
            .and_then(|bytes| bytes.as_ref().try_into().ok())
            .map(i64::from_be_bytes)
            .unwrap_or(0);
        Ok(previous + delta)
    }
}
