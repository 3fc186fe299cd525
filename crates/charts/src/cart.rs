//! Deterministic CART fitter for the synthetic-model fallback.
//!
//! Exact-greedy gini splitter over two classes. Exists only to back chart
//! generation when no trained artifact is available; it is not a training
//! product.

use mathperf_model::schema::{FEATURE_COLUMNS, FEATURE_COUNT};
use mathperf_model::{ClassifierModel, Node, Tree};
use std::collections::BTreeMap;

/// Stopping parameters for tree growth.
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Build a single classification tree with exact-greedy splits.
pub struct CartBuilder {
    config: TreeConfig,
    features: Vec<Vec<f64>>,
    labels: Vec<bool>,
    /// Accumulated impurity decrease per feature.
    importances: Vec<f64>,
}

impl CartBuilder {
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<bool>, config: TreeConfig) -> Self {
        assert_eq!(features.len(), labels.len());
        Self {
            config,
            features,
            labels,
            importances: vec![0.0; FEATURE_COUNT],
        }
    }

    /// Fit the tree and package it as a one-tree classifier model with
    /// normalized gini-decrease importances.
    pub fn fit(mut self) -> ClassifierModel {
        let indices: Vec<usize> = (0..self.labels.len()).collect();
        let mut nodes = Vec::new();
        self.build_node(&indices, 0, &mut nodes);

        let total: f64 = self.importances.iter().sum();
        let importances = if total > 0.0 {
            self.importances.iter().map(|v| v / total).collect()
        } else {
            self.importances.clone()
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), "synthetic-cart".to_string());
        metadata.insert("max_depth".to_string(), self.config.max_depth.to_string());

        ClassifierModel {
            version: 1,
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            feature_importances: importances,
            trees: vec![Tree { nodes }],
            metadata,
        }
    }

    fn build_node(&mut self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> u32 {
        let current_idx = nodes.len() as u32;
        let leaf_value = self.class_counts(indices);

        if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
            || leaf_value[0] == 0.0
            || leaf_value[1] == 0.0
        {
            nodes.push(leaf(leaf_value));
            return current_idx;
        }

        let split = match self.find_best_split(indices) {
            Some(split) => split,
            None => {
                nodes.push(leaf(leaf_value));
                return current_idx;
            }
        };

        let (left_indices, right_indices) =
            self.split_samples(indices, split.feature_idx, split.threshold);

        if left_indices.len() < self.config.min_samples_leaf
            || right_indices.len() < self.config.min_samples_leaf
        {
            nodes.push(leaf(leaf_value));
            return current_idx;
        }

        self.importances[split.feature_idx] +=
            indices.len() as f64 / self.labels.len() as f64 * split.gain;

        // Reserve the internal node, then wire in the children.
        nodes.push(Node {
            feature_index: split.feature_idx,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });

        let left_idx = self.build_node(&left_indices, depth + 1, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Best split by gini gain; ties break on lowest feature then lowest
    /// threshold so the fit is deterministic.
    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let parent_gini = self.gini(indices);
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..FEATURE_COUNT {
            for threshold in self.candidate_thresholds(indices, feature_idx) {
                let (left, right) = self.split_samples(indices, feature_idx, threshold);
                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }

                let n = indices.len() as f64;
                let weighted = left.len() as f64 / n * self.gini(&left)
                    + right.len() as f64 / n * self.gini(&right);
                let gain = parent_gini - weighted;
                if gain <= 0.0 {
                    continue;
                }

                let candidate = SplitCandidate {
                    feature_idx,
                    threshold,
                    gain,
                };

                best = match best {
                    None => Some(candidate),
                    Some(current) if candidate.gain > current.gain => Some(candidate),
                    Some(current) => Some(current),
                };
            }
        }

        best
    }

    /// Distinct sorted feature values over the partition; the last value
    /// is dropped because `x <= max` cannot split.
    fn candidate_thresholds(&self, indices: &[usize], feature_idx: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&idx| self.features[idx][feature_idx])
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        values.pop();
        values
    }

    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in indices {
            if self.features[idx][feature_idx] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }
        (left, right)
    }

    fn class_counts(&self, indices: &[usize]) -> [f64; 2] {
        let high = indices.iter().filter(|&&idx| self.labels[idx]).count();
        [(indices.len() - high) as f64, high as f64]
    }

    fn gini(&self, indices: &[usize]) -> f64 {
        let n = indices.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let [low, high] = self.class_counts(indices);
        let p_low = low / n;
        let p_high = high / n;
        1.0 - p_low * p_low - p_high * p_high
    }
}

fn leaf(value: [f64; 2]) -> Node {
    Node {
        feature_index: 0,
        threshold: 0.0,
        left: 0,
        right: 0,
        value: Some(value),
    }
}
