//! Synthetic fallback data and model.
//!
//! Used when the dataset artifact is absent: a seeded RNG produces a
//! reproducible stand-in dataset, encoders are fitted on it, and a shallow
//! CART is grown so the charts still have a model to describe.

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::{StudentDataset, StudentRow};
use crate::errors::ChartError;
use mathperf_model::schema::CATEGORICAL_COLUMNS;
use mathperf_model::{Artifacts, EncoderSet, LabelEncoder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// Seed matching the original chart job.
pub const DEFAULT_SEED: u64 = 42;

/// Sample count matching the original chart job.
pub const DEFAULT_SAMPLES: usize = 1000;

const GENDERS: [&str; 2] = ["male", "female"];
const ETHNICITIES: [&str; 5] = ["group A", "group B", "group C", "group D", "group E"];
const EDUCATION_LEVELS: [&str; 6] = [
    "some high school",
    "high school",
    "some college",
    "associate's degree",
    "bachelor's degree",
    "master's degree",
];
const LUNCH_TYPES: [&str; 2] = ["standard", "free/reduced"];
const TEST_PREPARATION: [&str; 2] = ["none", "completed"];

/// Generate a reproducible synthetic dataset: uniform category draws,
/// normal(70, 15) scores.
pub fn synthesize_dataset(seed: u64, samples: usize) -> StudentDataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let rows = (0..samples)
        .map(|_| StudentRow {
            gender: choose(&mut rng, &GENDERS),
            ethnicity: choose(&mut rng, &ETHNICITIES),
            parental_education: choose(&mut rng, &EDUCATION_LEVELS),
            lunch: choose(&mut rng, &LUNCH_TYPES),
            test_preparation: choose(&mut rng, &TEST_PREPARATION),
            reading_score: normal(&mut rng, 70.0, 15.0),
            writing_score: normal(&mut rng, 70.0, 15.0),
            math_score: normal(&mut rng, 70.0, 15.0),
        })
        .collect();

    StudentDataset { rows }
}

/// Fit encoders on the dataset and grow a depth-5 CART over it.
pub fn synthesize_model(dataset: &StudentDataset) -> Result<Artifacts, ChartError> {
    let mut encoders = EncoderSet::new();
    for (idx, column) in CATEGORICAL_COLUMNS.iter().enumerate() {
        let labels = dataset.rows.iter().map(|row| row.categories()[idx]);
        encoders.insert(*column, LabelEncoder::fit(labels));
    }
    encoders.validate()?;

    let features = dataset.encoded_features(&encoders)?;
    let labels = dataset.labels();
    let model = CartBuilder::new(features, labels, TreeConfig::default()).fit();
    model.validate()?;

    Ok(Artifacts { model, encoders })
}

fn choose(rng: &mut StdRng, labels: &[&str]) -> String {
    labels[rng.gen_range(0..labels.len())].to_string()
}

/// Box-Muller deviate over the seeded uniform source.
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
    mean + std_dev * z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_identical_rows() {
        let a = synthesize_dataset(DEFAULT_SEED, 50);
        let b = synthesize_dataset(DEFAULT_SEED, 50);
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = synthesize_dataset(1, 50);
        let b = synthesize_dataset(2, 50);
        assert_ne!(a.rows, b.rows);
    }

    #[test]
    fn categories_stay_in_vocabulary() {
        let dataset = synthesize_dataset(DEFAULT_SEED, 200);
        for row in &dataset.rows {
            assert!(GENDERS.contains(&row.gender.as_str()));
            assert!(ETHNICITIES.contains(&row.ethnicity.as_str()));
            assert!(EDUCATION_LEVELS.contains(&row.parental_education.as_str()));
            assert!(LUNCH_TYPES.contains(&row.lunch.as_str()));
            assert!(TEST_PREPARATION.contains(&row.test_preparation.as_str()));
        }
    }

    #[test]
    fn scores_center_near_the_mean() {
        let dataset = synthesize_dataset(DEFAULT_SEED, DEFAULT_SAMPLES);
        let mean: f64 = dataset.rows.iter().map(|r| r.math_score).sum::<f64>()
            / dataset.rows.len() as f64;
        assert!((mean - 70.0).abs() < 3.0);
    }

    #[test]
    fn synthetic_model_is_valid_and_usable() {
        let dataset = synthesize_dataset(DEFAULT_SEED, DEFAULT_SAMPLES);
        let artifacts = synthesize_model(&dataset).unwrap();

        artifacts.model.validate().unwrap();
        artifacts.encoders.validate().unwrap();

        let sum: f64 = artifacts.model.feature_importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);

        let features = dataset.encoded_features(&artifacts.encoders).unwrap();
        let proba = artifacts.model.predict_proba(&features[0]);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-9);
    }
}
