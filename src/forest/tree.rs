//! Single isolation tree construction and path-length scoring.

use rand::rngs::StdRng;
use rand::Rng;

use crate::types::{FeatureVector, ForestNode, IsolationTree, FOREST_FEATURE_COUNT};

const EULER_MASCHERONI: f64 = 0.5772156649015329;

fn harmonic(n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        (n as f64).ln() + EULER_MASCHERONI
    }
}

/// Average path length of an unsuccessful search in a binary search tree
/// over `n` points — the standard isolation-forest normalization constant.
pub fn path_length_correction(n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        2.0 * harmonic(n - 1) - 2.0 * (n as f64 - 1.0) / n as f64
    }
}

fn sample_with_replacement<'a>(
    vectors: &'a [FeatureVector],
    sample_size: usize,
    rng: &mut StdRng,
) -> Vec<&'a FeatureVector> {
    if vectors.is_empty() {
        return Vec::new();
    }
    (0..sample_size).map(|_| &vectors[rng.gen_range(0..vectors.len())]).collect()
}

fn min_max(data: &[&FeatureVector], feature: usize) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in data {
        let value = v[feature];
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    (min, max)
}

fn all_same(data: &[&FeatureVector]) -> bool {
    data.windows(2).all(|w| w[0] == w[1])
}

pub fn build_tree(vectors: &[FeatureVector], sample_size: usize, height_limit: usize, rng: &mut StdRng) -> IsolationTree {
    let sample = sample_with_replacement(vectors, sample_size, rng);
    let mut nodes = Vec::new();
    build_node(&sample, 0, height_limit, rng, &mut nodes);
    IsolationTree { nodes, height_limit }
}

/// Reserves a slot for this node before recursing, so the root of the whole
/// tree always ends up at index 0 (`nodes` starts empty on the outermost
/// call). Returns the index of the node just written.
fn build_node(data: &[&FeatureVector], depth: usize, height_limit: usize, rng: &mut StdRng, nodes: &mut Vec<ForestNode>) -> usize {
    let idx = nodes.len();
    nodes.push(ForestNode::Leaf { size: data.len() });

    if data.len() <= 1 || depth >= height_limit || all_same(data) {
        return idx;
    }

    // Try a handful of feature picks for one with a non-degenerate range.
    let mut feature = rng.gen_range(0..FOREST_FEATURE_COUNT);
    let mut bounds = min_max(data, feature);
    for _ in 0..FOREST_FEATURE_COUNT {
        if (bounds.1 - bounds.0).abs() > 1e-12 {
            break;
        }
        feature = rng.gen_range(0..FOREST_FEATURE_COUNT);
        bounds = min_max(data, feature);
    }
    if (bounds.1 - bounds.0).abs() <= 1e-12 {
        return idx; // every feature is constant across this sample
    }

    let split = rng.gen_range(bounds.0..bounds.1);
    let left_data: Vec<&FeatureVector> = data.iter().filter(|v| v[feature] < split).copied().collect();
    let right_data: Vec<&FeatureVector> = data.iter().filter(|v| v[feature] >= split).copied().collect();

    if left_data.is_empty() || right_data.is_empty() {
        return idx;
    }

    let left = build_node(&left_data, depth + 1, height_limit, rng, nodes);
    let right = build_node(&right_data, depth + 1, height_limit, rng, nodes);
    nodes[idx] = ForestNode::Split { feature, threshold: split, left, right };
    idx
}

pub fn path_length(tree: &IsolationTree, x: &FeatureVector) -> f64 {
    let mut idx = 0;
    let mut depth = 0.0;
    loop {
        match &tree.nodes[idx] {
            ForestNode::Leaf { size } => {
                depth += path_length_correction(*size);
                break;
            }
            ForestNode::Split { feature, threshold, left, right } => {
                depth += 1.0;
                idx = if x[*feature] < *threshold { *left } else { *right };
            }
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn vectors() -> Vec<FeatureVector> {
        (0..40)
            .map(|i| {
                let x = i as f64;
                [x, x, x, x, x, x, x, x]
            })
            .collect()
    }

    #[test]
    fn tree_root_is_at_index_zero() {
        let mut rng = StdRng::seed_from_u64(42);
        let tree = build_tree(&vectors(), 16, 4, &mut rng);
        assert!(!tree.nodes.is_empty());
    }

    #[test]
    fn path_length_terminates_for_every_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = vectors();
        let tree = build_tree(&data, 16, 4, &mut rng);
        for v in &data {
            let len = path_length(&tree, v);
            assert!(len.is_finite());
            assert!(len >= 0.0);
        }
    }

    #[test]
    fn path_length_correction_matches_known_values() {
        assert_eq!(path_length_correction(0), 0.0);
        assert_eq!(path_length_correction(1), 0.0);
        // c(2) = 2*H(1) - 2*1/2 = 2*1 - 1 = 1.0
        assert!((path_length_correction(2) - 1.0).abs() < 1e-9);
    }
}
