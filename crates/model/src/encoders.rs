//! Fitted categorical encoders.
//!
//! A `LabelEncoder` maps a category label to its integer code and back;
//! codes are positions in the sorted class list, matching how the training
//! step fitted them. Encoders are read-only at inference time.

use crate::errors::ArtifactError;
use crate::schema::CATEGORICAL_COLUMNS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One fitted encoder: `classes[code] == label`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on observed labels: sort and dedup, code = sorted position.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Code for a label, or `None` when the label was never fitted.
    /// Lookup is exact; no trimming or case folding.
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    /// Label for a code.
    pub fn inverse(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Encoders keyed by schema column name. BTreeMap keeps the JSON artifact
/// in a canonical key order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderSet {
    pub encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, column: S, encoder: LabelEncoder) {
        self.encoders.insert(column.into(), encoder);
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    /// Every categorical schema column must have a non-empty encoder.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        for column in CATEGORICAL_COLUMNS {
            match self.encoders.get(column) {
                None => {
                    return Err(ArtifactError::InvalidEncoders(format!(
                        "missing encoder for column '{column}'"
                    )))
                }
                Some(encoder) if encoder.is_empty() => {
                    return Err(ArtifactError::InvalidEncoders(format!(
                        "encoder for column '{column}' has no classes"
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let data = fs::read_to_string(path.as_ref())?;
        let set: Self = serde_json::from_str(&data)?;
        set.validate()?;
        Ok(set)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> LabelEncoder {
        LabelEncoder::fit(["standard", "free/reduced", "standard"])
    }

    #[test]
    fn fit_sorts_and_dedups() {
        let encoder = fitted();
        assert_eq!(encoder.classes, vec!["free/reduced", "standard"]);
    }

    #[test]
    fn transform_round_trips_through_inverse() {
        let encoder = fitted();
        let code = encoder.transform("standard").unwrap();
        assert_eq!(encoder.inverse(code), Some("standard"));
    }

    #[test]
    fn transform_rejects_unfitted_label() {
        assert_eq!(fitted().transform("premium"), None);
    }

    #[test]
    fn transform_is_exact_on_case_and_whitespace() {
        let encoder = fitted();
        assert_eq!(encoder.transform("Standard"), None);
        assert_eq!(encoder.transform(" standard"), None);
    }

    #[test]
    fn validate_requires_all_categorical_columns() {
        let mut set = EncoderSet::new();
        set.insert("gender", LabelEncoder::fit(["female", "male"]));
        let err = set.validate().unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidEncoders(_)));
    }

    #[test]
    fn validate_rejects_empty_encoder() {
        let mut set = EncoderSet::new();
        for column in CATEGORICAL_COLUMNS {
            set.insert(column, LabelEncoder::fit(["a", "b"]));
        }
        set.insert("lunch", LabelEncoder { classes: vec![] });
        assert!(set.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let mut set = EncoderSet::new();
        for column in CATEGORICAL_COLUMNS {
            set.insert(column, LabelEncoder::fit(["a", "b", "c"]));
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label_encoders.json");
        set.save_json(&path).unwrap();
        let loaded = EncoderSet::from_json_file(&path).unwrap();
        assert_eq!(loaded, set);
    }
}
