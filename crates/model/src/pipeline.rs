//! The inference pipeline.
//!
//! One `PredictionRequest` in, one `Prediction` out: validate the request,
//! assemble the feature record in schema order, run the categorical values
//! through the fitted encoders, and shape the classifier's output. Pure
//! function of the request and the loaded artifacts.

use crate::artifacts::Artifacts;
use crate::errors::PredictError;
use crate::schema::{CATEGORICAL_COLUMNS, CATEGORICAL_REQUEST_FIELDS, DEFAULT_SCORE, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Client-submitted prediction request body. Validation happens in
/// [`StudentRecord::from_request`], not during deserialization.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PredictionRequest {
    pub gender: Option<String>,
    pub race_ethnicity: Option<String>,
    pub parental_education: Option<String>,
    pub lunch: Option<String>,
    pub test_preparation: Option<String>,
    pub reading_score: Option<f64>,
    pub writing_score: Option<f64>,
}

/// A validated, fully populated feature record in schema order.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentRecord {
    /// The five categorical values, in `CATEGORICAL_COLUMNS` order.
    pub categories: [String; 5],
    pub reading_score: f64,
    pub writing_score: f64,
}

impl StudentRecord {
    /// Validate a request into a record.
    ///
    /// Categorical fields are checked in schema order and the first missing
    /// one wins; values pass through verbatim. Absent scores take
    /// `DEFAULT_SCORE`.
    pub fn from_request(request: &PredictionRequest) -> Result<Self, PredictError> {
        let supplied = [
            request.gender.as_ref(),
            request.race_ethnicity.as_ref(),
            request.parental_education.as_ref(),
            request.lunch.as_ref(),
            request.test_preparation.as_ref(),
        ];

        let mut categories: [String; 5] = Default::default();
        for (slot, ((field, _), value)) in categories
            .iter_mut()
            .zip(CATEGORICAL_REQUEST_FIELDS.into_iter().zip(supplied))
        {
            match value {
                Some(value) => *slot = value.clone(),
                None => return Err(PredictError::MissingField(field)),
            }
        }

        Ok(Self {
            categories,
            reading_score: request.reading_score.unwrap_or(DEFAULT_SCORE),
            writing_score: request.writing_score.unwrap_or(DEFAULT_SCORE),
        })
    }
}

/// Prediction wire shape.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Prediction {
    pub prediction: u8,
    pub probability_high: f64,
    pub probability_low: f64,
    pub status: String,
    pub description: String,
}

const STATUS_HIGH: &str = "PERFORMA TINGGI";
const STATUS_LOW: &str = "PERFORMA RENDAH";
const DESCRIPTION_HIGH: &str =
    "Mahasiswa diprediksi akan memiliki nilai matematika tinggi (≥70)";
const DESCRIPTION_LOW: &str =
    "Mahasiswa diprediksi akan memiliki nilai matematika rendah (<70)";

/// The readiness-checked inference context.
///
/// Constructed once at startup; `artifacts` is `None` when loading failed
/// and the service is degraded. Never mutated after construction, so it can
/// be shared across request handlers without locking.
#[derive(Clone, Debug, Default)]
pub struct PredictService {
    artifacts: Option<Arc<Artifacts>>,
}

impl PredictService {
    pub fn new(artifacts: Option<Artifacts>) -> Self {
        Self {
            artifacts: artifacts.map(Arc::new),
        }
    }

    /// Whether the model and encoders are loaded.
    pub fn is_ready(&self) -> bool {
        self.artifacts.is_some()
    }

    /// Run the pipeline for one request.
    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction, PredictError> {
        // Readiness comes before any request validation.
        let artifacts = self
            .artifacts
            .as_deref()
            .ok_or(PredictError::ModelUnavailable)?;

        let record = StudentRecord::from_request(request)?;
        let features = encode_features(&record, artifacts)?;

        let proba = artifacts.model.predict_proba(&features);
        let label = artifacts.model.predict(&features);

        Ok(Prediction {
            prediction: label,
            probability_high: proba[1],
            probability_low: proba[0],
            status: if label == 1 { STATUS_HIGH } else { STATUS_LOW }.to_string(),
            description: if label == 1 {
                DESCRIPTION_HIGH
            } else {
                DESCRIPTION_LOW
            }
            .to_string(),
        })
    }
}

/// Assemble the numeric feature vector: encoded categoricals in schema
/// order, then reading score, then writing score.
fn encode_features(record: &StudentRecord, artifacts: &Artifacts) -> Result<Vec<f64>, PredictError> {
    let mut features = Vec::with_capacity(FEATURE_COUNT);

    for (column, value) in CATEGORICAL_COLUMNS.iter().zip(&record.categories) {
        let encoder = artifacts.encoders.get(column).ok_or_else(|| {
            PredictError::Unexpected(format!("no encoder loaded for column '{column}'"))
        })?;
        let code = encoder
            .transform(value)
            .ok_or_else(|| PredictError::UnknownCategory {
                field: column.to_string(),
                value: value.clone(),
            })?;
        features.push(code as f64);
    }

    features.push(record.reading_score);
    features.push(record.writing_score);
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::{EncoderSet, LabelEncoder};
    use crate::model::test_support::reading_split_model;

    fn fitted_encoders() -> EncoderSet {
        let mut set = EncoderSet::new();
        set.insert("gender", LabelEncoder::fit(["female", "male"]));
        set.insert(
            "race/ethnicity",
            LabelEncoder::fit(["group A", "group B", "group C", "group D", "group E"]),
        );
        set.insert(
            "parental level of education",
            LabelEncoder::fit([
                "associate's degree",
                "bachelor's degree",
                "high school",
                "master's degree",
                "some college",
                "some high school",
            ]),
        );
        set.insert("lunch", LabelEncoder::fit(["free/reduced", "standard"]));
        set.insert(
            "test preparation course",
            LabelEncoder::fit(["completed", "none"]),
        );
        set
    }

    fn ready_service() -> PredictService {
        PredictService::new(Some(Artifacts {
            model: reading_split_model(),
            encoders: fitted_encoders(),
        }))
    }

    fn full_request() -> PredictionRequest {
        PredictionRequest {
            gender: Some("male".into()),
            race_ethnicity: Some("group B".into()),
            parental_education: Some("bachelor's degree".into()),
            lunch: Some("standard".into()),
            test_preparation: Some("completed".into()),
            reading_score: None,
            writing_score: None,
        }
    }

    #[test]
    fn happy_path_returns_valid_distribution() {
        let result = ready_service().predict(&full_request()).unwrap();
        assert!(result.prediction <= 1);
        assert!((result.probability_high + result.probability_low - 1.0).abs() < 1e-9);
    }

    #[test]
    fn high_label_shapes_status_and_description() {
        let mut request = full_request();
        request.reading_score = Some(95.0);
        let result = ready_service().predict(&request).unwrap();
        assert_eq!(result.prediction, 1);
        assert_eq!(result.status, "PERFORMA TINGGI");
        assert!(result.description.contains("tinggi"));
    }

    #[test]
    fn low_label_shapes_status_and_description() {
        let mut request = full_request();
        request.reading_score = Some(40.0);
        let result = ready_service().predict(&request).unwrap();
        assert_eq!(result.prediction, 0);
        assert_eq!(result.status, "PERFORMA RENDAH");
        assert!(result.description.contains("rendah"));
    }

    #[test]
    fn first_missing_field_wins_in_schema_order() {
        let mut request = full_request();
        request.race_ethnicity = None;
        request.lunch = None;
        let err = ready_service().predict(&request).unwrap_err();
        assert_eq!(err, PredictError::MissingField("race_ethnicity"));
    }

    #[test]
    fn each_missing_field_is_named() {
        for (idx, (field, _)) in CATEGORICAL_REQUEST_FIELDS.into_iter().enumerate() {
            let mut request = full_request();
            match idx {
                0 => request.gender = None,
                1 => request.race_ethnicity = None,
                2 => request.parental_education = None,
                3 => request.lunch = None,
                _ => request.test_preparation = None,
            }
            let err = ready_service().predict(&request).unwrap_err();
            assert_eq!(err, PredictError::MissingField(field));
        }
    }

    #[test]
    fn concrete_reference_request_encodes_to_known_codes() {
        let artifacts = Artifacts {
            model: reading_split_model(),
            encoders: fitted_encoders(),
        };
        let record = StudentRecord::from_request(&full_request()).unwrap();
        let features = encode_features(&record, &artifacts).unwrap();
        // male=1, group B=1, bachelor's degree=1, standard=1, completed=0
        assert_eq!(features, vec![1.0, 1.0, 1.0, 1.0, 0.0, 75.0, 75.0]);
    }

    #[test]
    fn missing_scores_default_to_75() {
        let service = ready_service();
        let defaulted = service.predict(&full_request()).unwrap();

        let mut explicit = full_request();
        explicit.reading_score = Some(75.0);
        explicit.writing_score = Some(75.0);
        let explicit = service.predict(&explicit).unwrap();

        assert_eq!(defaulted, explicit);
    }

    #[test]
    fn unknown_category_names_field_and_value() {
        let mut request = full_request();
        request.race_ethnicity = Some("group Z".into());
        let err = ready_service().predict(&request).unwrap_err();
        assert_eq!(
            err,
            PredictError::UnknownCategory {
                field: "race/ethnicity".into(),
                value: "group Z".into(),
            }
        );
    }

    #[test]
    fn categorical_values_are_not_normalized() {
        let mut request = full_request();
        request.lunch = Some("Standard".into());
        let err = ready_service().predict(&request).unwrap_err();
        assert!(matches!(err, PredictError::UnknownCategory { .. }));
    }

    #[test]
    fn unready_service_rejects_before_validation() {
        let service = PredictService::new(None);
        assert!(!service.is_ready());
        // Even an empty request reports ModelUnavailable, not MissingField.
        let err = service.predict(&PredictionRequest::default()).unwrap_err();
        assert_eq!(err, PredictError::ModelUnavailable);
    }

    #[test]
    fn identical_requests_are_deterministic() {
        let service = ready_service();
        let a = service.predict(&full_request()).unwrap();
        let b = service.predict(&full_request()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn wire_text_matches_error_taxonomy() {
        assert_eq!(
            PredictError::MissingField("gender").to_string(),
            "Field gender wajib diisi"
        );
        assert_eq!(
            PredictError::ModelUnavailable.to_string(),
            "Model belum dimuat. Silakan coba lagi dalam beberapa saat."
        );
        assert_eq!(
            PredictError::Unexpected("boom".into()).to_string(),
            "Terjadi kesalahan: boom"
        );
    }
}
