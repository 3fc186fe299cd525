//! Decision-tree ensemble classifier.
//!
//! The model artifact is a flat-node tree forest: internal nodes route
//! `x[feature_index] <= threshold` to the left child, leaves carry class
//! weights `[low, high]`. Probabilities are the per-leaf weight
//! distribution averaged across trees.

use crate::errors::ArtifactError;
use crate::schema::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A decision tree node (internal or leaf). Root is at index 0.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to compare (for internal nodes)
    pub feature_index: usize,
    /// Threshold value for comparison
    pub threshold: f64,
    /// Index of left child node
    pub left: u32,
    /// Index of right child node
    pub right: u32,
    /// Leaf class weights `[low, high]` (None for internal nodes)
    pub value: Option<[f64; 2]>,
}

/// A single decision tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf and return its class weights.
    fn leaf_weights(&self, features: &[f64]) -> [f64; 2] {
        let mut idx = 0usize;
        loop {
            if idx >= self.nodes.len() {
                // Unreachable on a validated model
                return [0.0, 0.0];
            }

            let node = &self.nodes[idx];
            if let Some(weights) = node.value {
                return weights;
            }

            if node.feature_index >= features.len() {
                return [0.0, 0.0];
            }

            idx = if features[node.feature_index] <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }
}

/// Complete trained binary classifier.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassifierModel {
    /// Artifact format version
    pub version: u32,
    /// Number of input features
    pub feature_count: usize,
    /// Feature names in input order
    pub feature_names: Vec<String>,
    /// Per-feature importance, normalized to sum 1
    pub feature_importances: Vec<f64>,
    /// The ensemble
    pub trees: Vec<Tree>,
    /// Free-form training metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ClassifierModel {
    /// Class probabilities `[prob(low), prob(high)]` for one feature vector.
    pub fn predict_proba(&self, features: &[f64]) -> [f64; 2] {
        let mut total = [0.0f64, 0.0f64];
        for tree in &self.trees {
            let weights = tree.leaf_weights(features);
            let sum = weights[0] + weights[1];
            if sum > 0.0 {
                total[0] += weights[0] / sum;
                total[1] += weights[1] / sum;
            }
        }

        let n = self.trees.len() as f64;
        if n > 0.0 {
            total[0] /= n;
            total[1] /= n;
        }
        total
    }

    /// Class label: 1 iff `prob(high) > prob(low)`, ties go to class 0.
    pub fn predict(&self, features: &[f64]) -> u8 {
        let proba = self.predict_proba(features);
        u8::from(proba[1] > proba[0])
    }

    /// Structural validation of a deserialized artifact.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("model has no trees".into()));
        }
        if self.feature_count != FEATURE_COUNT {
            return Err(ArtifactError::InvalidModel(format!(
                "model expects {} features, schema has {FEATURE_COUNT}",
                self.feature_count
            )));
        }
        if self.feature_names.len() != self.feature_count {
            return Err(ArtifactError::InvalidModel(format!(
                "feature_names has {} entries for {} features",
                self.feature_names.len(),
                self.feature_count
            )));
        }
        if self.feature_importances.len() != self.feature_count {
            return Err(ArtifactError::InvalidModel(format!(
                "feature_importances has {} entries for {} features",
                self.feature_importances.len(),
                self.feature_count
            )));
        }

        for (t_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ArtifactError::InvalidModel(format!(
                    "tree {t_idx} has no nodes"
                )));
            }

            for (n_idx, node) in tree.nodes.iter().enumerate() {
                match node.value {
                    Some(weights) => {
                        if node.left != 0 || node.right != 0 {
                            return Err(ArtifactError::InvalidModel(format!(
                                "tree {t_idx} node {n_idx} is a leaf with children"
                            )));
                        }
                        if weights[0] < 0.0 || weights[1] < 0.0 {
                            return Err(ArtifactError::InvalidModel(format!(
                                "tree {t_idx} node {n_idx} has negative class weights"
                            )));
                        }
                        if weights[0] + weights[1] <= 0.0 {
                            return Err(ArtifactError::InvalidModel(format!(
                                "tree {t_idx} node {n_idx} has no class weight"
                            )));
                        }
                    }
                    None => {
                        if node.feature_index >= self.feature_count {
                            return Err(ArtifactError::InvalidModel(format!(
                                "tree {t_idx} node {n_idx} references feature {}",
                                node.feature_index
                            )));
                        }
                        let len = tree.nodes.len();
                        for child in [node.left, node.right] {
                            if child as usize >= len || child == 0 {
                                return Err(ArtifactError::InvalidModel(format!(
                                    "tree {t_idx} node {n_idx} has invalid child {child}"
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let data = fs::read_to_string(path.as_ref())?;
        let model: Self = serde_json::from_str(&data)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::schema::FEATURE_COLUMNS;

    pub fn leaf(low: f64, high: f64) -> Node {
        Node {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some([low, high]),
        }
    }

    pub fn split(feature_index: usize, threshold: f64, left: u32, right: u32) -> Node {
        Node {
            feature_index,
            threshold,
            left,
            right,
            value: None,
        }
    }

    /// Single tree: reading score (feature 5) <= 70 predicts low, else high.
    pub fn reading_split_model() -> ClassifierModel {
        ClassifierModel {
            version: 1,
            feature_count: FEATURE_COLUMNS.len(),
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            feature_importances: vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            trees: vec![Tree {
                nodes: vec![split(5, 70.0, 1, 2), leaf(8.0, 2.0), leaf(1.0, 3.0)],
            }],
            metadata: BTreeMap::new(),
        }
    }
}
