//! Training-time feature schema.
//!
//! Column names and their order are the key space of the encoder artifact
//! and the positional contract of the classifier. They must match the
//! training step exactly, including the dataset's original spelling.

/// Categorical feature columns, in training order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race/ethnicity",
    "parental level of education",
    "lunch",
    "test preparation course",
];

/// Numeric feature columns, in training order (after the categoricals).
pub const NUMERIC_COLUMNS: [&str; 2] = ["reading score", "writing score"];

/// All feature columns in the order the model consumes them.
pub const FEATURE_COLUMNS: [&str; 7] = [
    "gender",
    "race/ethnicity",
    "parental level of education",
    "lunch",
    "test preparation course",
    "reading score",
    "writing score",
];

/// Label source column. Not a model input.
pub const MATH_SCORE_COLUMN: &str = "math score";

/// Request-body names for the categorical fields, paired with their schema
/// columns. Missing-field errors report the request-body name.
pub const CATEGORICAL_REQUEST_FIELDS: [(&str, &str); 5] = [
    ("gender", "gender"),
    ("race_ethnicity", "race/ethnicity"),
    ("parental_education", "parental level of education"),
    ("lunch", "lunch"),
    ("test_preparation", "test preparation course"),
];

/// Math score at or above this counts as high performance.
pub const PASS_THRESHOLD: f64 = 70.0;

/// Substitute used when a request omits a reading or writing score.
/// A compatibility placeholder carried over from the trained deployment;
/// changing it changes predictions for score-less requests.
pub const DEFAULT_SCORE: f64 = 75.0;

/// Number of model input features.
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_order_is_categoricals_then_numerics() {
        let mut expected: Vec<&str> = CATEGORICAL_COLUMNS.to_vec();
        expected.extend(NUMERIC_COLUMNS);
        assert_eq!(FEATURE_COLUMNS.to_vec(), expected);
    }

    #[test]
    fn request_fields_map_onto_categorical_columns() {
        for ((_, column), expected) in CATEGORICAL_REQUEST_FIELDS.iter().zip(CATEGORICAL_COLUMNS) {
            assert_eq!(*column, expected);
        }
    }

    #[test]
    fn label_column_is_not_a_feature() {
        assert!(!FEATURE_COLUMNS.contains(&MATH_SCORE_COLUMN));
    }
}
