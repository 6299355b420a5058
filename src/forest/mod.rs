//! Isolation Forest: per-client offline training
//! and per-transaction scoring. Persistence is a thin wrapper around
//! [`crate::store::Store`] using the array-of-structs tree representation
//! in [`crate::types::forest`].
//!
//! RNG is seeded deterministically from `clientId` (an FNV-1a hash, chosen
//! over `DefaultHasher` for a seed that's stable across toolchain
//! versions) so training is reproducible bit-for-bit.

mod features;
mod tree;

pub use features::extract_features;

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::defaults;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::{FeatureVector, IsolationForestModel, IsolationTree, FOREST_FEATURE_COUNT};

fn seed_from_client_id(client_id: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in client_id.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Trains a fresh model for `client_id` from `vectors`. Callers
/// are responsible for the `minTrainingSamples` guard.
pub fn train(client_id: &str, vectors: &[FeatureVector], num_trees: usize, sample_size: usize) -> IsolationForestModel {
    let mut rng = StdRng::seed_from_u64(seed_from_client_id(client_id));
    let height_limit = ((sample_size.max(2) as f64).log2().ceil() as usize).max(1);

    let trees: Vec<IsolationTree> = (0..num_trees)
        .map(|_| tree::build_tree(vectors, sample_size, height_limit, &mut rng))
        .collect();

    IsolationForestModel {
        client_id: client_id.to_string(),
        trees,
        sample_size,
        feature_count: FOREST_FEATURE_COUNT,
        trained_at: Utc::now().timestamp_millis(),
        training_sample_count: vectors.len(),
        version: 1,
    }
}

/// Anomaly score `s(x) ∈ (0,1)` for `features` under `model`.
pub fn score(model: &IsolationForestModel, features: &FeatureVector) -> f64 {
    if model.trees.is_empty() {
        return 0.5;
    }
    let avg_path: f64 =
        model.trees.iter().map(|t| tree::path_length(t, features)).sum::<f64>() / model.trees.len() as f64;
    let cn = tree::path_length_correction(model.sample_size);
    if cn <= 0.0 {
        return 0.5;
    }
    2f64.powf(-avg_path / cn)
}

/// Persists a trained model, keyed by `client_id`.
pub async fn persist<S: Store>(store: &S, model: &IsolationForestModel) -> Result<(), StoreError> {
    store.put(defaults::SET_IF_MODELS, &model.client_id, model).await?;
    debug!(client_id = %model.client_id, tree_count = model.trees.len(), "isolation forest model persisted");
    Ok(())
}

pub async fn load<S: Store>(store: &S, client_id: &str) -> Result<Option<IsolationForestModel>, StoreError> {
    store.get(defaults::SET_IF_MODELS, client_id).await
}

/// Trains, persists, and returns a fresh model for `client_id` using the
/// configured tree count and sample size.
pub async fn train_and_persist<S: Store>(
    store: &Arc<S>,
    client_id: &str,
    vectors: &[FeatureVector],
) -> Result<IsolationForestModel, StoreError> {
    let config = crate::config::get();
    let model = train(client_id, vectors, config.forest.num_trees, config.forest.sample_size);
    persist(store.as_ref(), &model).await?;
    Ok(model)
}
