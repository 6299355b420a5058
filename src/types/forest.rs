//! Persisted Isolation Forest model record. The tree
//! ensemble itself lives in [`crate::forest`]; this module is just the
//! stored/serialized shape, kept in `types` alongside the rest of the data
//! model alongside the other persisted record kinds.

use serde::{Deserialize, Serialize};

/// Fixed feature count extracted per transaction.
pub const FOREST_FEATURE_COUNT: usize = 8;

/// One isolation tree node. Array-of-structs, index-addressed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ForestNode {
    Leaf {
        /// Number of samples that reached this leaf, used for the `c(n)`
        /// path-length correction at scoring time.
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One isolation tree: a flat node array rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsolationTree {
    pub nodes: Vec<ForestNode>,
    pub height_limit: usize,
}

/// A trained, serializable Isolation Forest for one client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsolationForestModel {
    pub client_id: String,
    pub trees: Vec<IsolationTree>,
    pub sample_size: usize,
    pub feature_count: usize,
    pub trained_at: i64,
    pub training_sample_count: usize,
    /// Internal format version tag.
    pub version: u32,
}

/// The 8 standardized features extracted per transaction.
pub type FeatureVector = [f64; FOREST_FEATURE_COUNT];
