//! Loading of persisted model and encoder artifacts.
//!
//! Both artifacts are read once at process start. A failed load leaves the
//! service without artifacts; it keeps serving and reports the degraded
//! state through the readiness check.

use crate::encoders::EncoderSet;
use crate::errors::ArtifactError;
use crate::model::ClassifierModel;
use crate::schema::FEATURE_COLUMNS;
use std::path::Path;
use tracing::info;

/// Default model artifact filename.
pub const DEFAULT_MODEL_PATH: &str = "math_performance_model.json";

/// Default encoder-set artifact filename.
pub const DEFAULT_ENCODERS_PATH: &str = "label_encoders.json";

/// The loaded, validated model and encoder set.
#[derive(Clone, Debug)]
pub struct Artifacts {
    pub model: ClassifierModel,
    pub encoders: EncoderSet,
}

impl Artifacts {
    /// Load both artifacts from disk.
    ///
    /// Checks file existence up front so a missing file is reported as
    /// `NotFound` naming the path rather than a bare I/O error, then
    /// deserializes, validates, and cross-checks the model's feature
    /// names against the schema.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        encoders_path: Q,
    ) -> Result<Self, ArtifactError> {
        let model_path = model_path.as_ref();
        let encoders_path = encoders_path.as_ref();

        if !model_path.exists() {
            return Err(ArtifactError::NotFound(model_path.display().to_string()));
        }
        if !encoders_path.exists() {
            return Err(ArtifactError::NotFound(encoders_path.display().to_string()));
        }

        let model = ClassifierModel::from_json_file(model_path)?;
        if model.feature_names != FEATURE_COLUMNS {
            return Err(ArtifactError::InvalidModel(format!(
                "feature names {:?} do not match the training schema",
                model.feature_names
            )));
        }

        let encoders = EncoderSet::from_json_file(encoders_path)?;

        info!(
            trees = model.trees.len(),
            encoders = encoders.encoders.len(),
            "loaded model and label encoders"
        );

        Ok(Self { model, encoders })
    }
}
