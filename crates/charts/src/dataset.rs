//! Training dataset loading and summary statistics.

use crate::errors::ChartError;
use mathperf_model::schema::{
    CATEGORICAL_COLUMNS, FEATURE_COUNT, MATH_SCORE_COLUMN, NUMERIC_COLUMNS, PASS_THRESHOLD,
};
use mathperf_model::EncoderSet;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Default dataset filename.
pub const DEFAULT_DATASET_PATH: &str = "dataset_mahasiswa.csv";

/// One student row as read from the dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentRow {
    pub gender: String,
    pub ethnicity: String,
    pub parental_education: String,
    pub lunch: String,
    pub test_preparation: String,
    pub reading_score: f64,
    pub writing_score: f64,
    pub math_score: f64,
}

impl StudentRow {
    /// Categorical values in schema column order.
    pub fn categories(&self) -> [&str; 5] {
        [
            &self.gender,
            &self.ethnicity,
            &self.parental_education,
            &self.lunch,
            &self.test_preparation,
        ]
    }

    /// Binary label: math score at or above the pass threshold.
    pub fn high_performance(&self) -> bool {
        self.math_score >= PASS_THRESHOLD
    }
}

/// The loaded dataset.
#[derive(Clone, Debug, Default)]
pub struct StudentDataset {
    pub rows: Vec<StudentRow>,
}

impl StudentDataset {
    /// Read the dataset from a CSV file with the training-time headers.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, ChartError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;

        let headers = reader.headers()?.clone();
        let column = |name: &str| -> Result<usize, ChartError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ChartError::Dataset(format!("missing column '{name}'")))
        };

        let categorical: Vec<usize> = CATEGORICAL_COLUMNS
            .iter()
            .map(|c| column(c))
            .collect::<Result<_, _>>()?;
        let numeric: Vec<usize> = NUMERIC_COLUMNS
            .iter()
            .map(|c| column(c))
            .collect::<Result<_, _>>()?;
        let math = column(MATH_SCORE_COLUMN)?;

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = idx + 2; // header is line 1

            let field = |col: usize| -> Result<String, ChartError> {
                record
                    .get(col)
                    .map(str::to_string)
                    .ok_or_else(|| ChartError::Dataset(format!("line {line}: short record")))
            };
            let score = |col: usize, name: &str| -> Result<f64, ChartError> {
                let raw = record.get(col).unwrap_or("");
                raw.trim().parse::<f64>().map_err(|_| {
                    ChartError::Dataset(format!("line {line}: invalid {name} '{raw}'"))
                })
            };

            rows.push(StudentRow {
                gender: field(categorical[0])?,
                ethnicity: field(categorical[1])?,
                parental_education: field(categorical[2])?,
                lunch: field(categorical[3])?,
                test_preparation: field(categorical[4])?,
                reading_score: score(numeric[0], NUMERIC_COLUMNS[0])?,
                writing_score: score(numeric[1], NUMERIC_COLUMNS[1])?,
                math_score: score(math, MATH_SCORE_COLUMN)?,
            });
        }

        info!(rows = rows.len(), "loaded dataset");
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (low, high) class counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let high = self.rows.iter().filter(|r| r.high_performance()).count();
        (self.rows.len() - high, high)
    }

    /// High-performance share (percent) grouped by one categorical field,
    /// ordered by category label.
    pub fn high_share_by<F>(&self, key: F) -> Vec<(String, f64)>
    where
        F: Fn(&StudentRow) -> &str,
    {
        let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for row in &self.rows {
            let entry = groups.entry(key(row).to_string()).or_default();
            entry.0 += 1;
            if row.high_performance() {
                entry.1 += 1;
            }
        }

        groups
            .into_iter()
            .map(|(label, (total, high))| (label, 100.0 * high as f64 / total as f64))
            .collect()
    }

    /// Encode every row into a model feature vector using fitted encoders.
    /// Rows with labels outside the vocabulary are an error.
    pub fn encoded_features(&self, encoders: &EncoderSet) -> Result<Vec<Vec<f64>>, ChartError> {
        self.rows
            .iter()
            .map(|row| {
                let mut features = Vec::with_capacity(FEATURE_COUNT);
                for (column, value) in CATEGORICAL_COLUMNS.iter().zip(row.categories()) {
                    let code = encoders
                        .get(column)
                        .and_then(|encoder| encoder.transform(value))
                        .ok_or_else(|| {
                            ChartError::Dataset(format!(
                                "value '{value}' not encodable for column '{column}'"
                            ))
                        })?;
                    features.push(code as f64);
                }
                features.push(row.reading_score);
                features.push(row.writing_score);
                Ok(features)
            })
            .collect()
    }

    /// Binary labels in row order.
    pub fn labels(&self) -> Vec<bool> {
        self.rows.iter().map(StudentRow::high_performance).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathperf_model::LabelEncoder;

    const CSV_FIXTURE: &str = "\
gender,race/ethnicity,parental level of education,lunch,test preparation course,math score,reading score,writing score
female,group B,bachelor's degree,standard,none,72,72,74
male,group A,high school,free/reduced,completed,47,57,44
female,group C,some college,standard,none,90,95,93
";

    fn fixture() -> StudentDataset {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DATASET_PATH);
        std::fs::write(&path, CSV_FIXTURE).unwrap();
        StudentDataset::from_csv(&path).unwrap()
    }

    #[test]
    fn from_csv_reads_rows_by_header_name() {
        let dataset = fixture();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows[1].gender, "male");
        assert_eq!(dataset.rows[1].math_score, 47.0);
        assert_eq!(dataset.rows[2].reading_score, 95.0);
    }

    #[test]
    fn labels_threshold_math_score_at_70() {
        let dataset = fixture();
        assert_eq!(dataset.labels(), vec![true, false, true]);
        assert_eq!(dataset.class_counts(), (1, 2));
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "gender,lunch\nmale,standard\n").unwrap();
        let err = StudentDataset::from_csv(&path).unwrap_err();
        assert!(matches!(err, ChartError::Dataset(_)));
    }

    #[test]
    fn non_numeric_score_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let mut csv = CSV_FIXTURE.to_string();
        csv = csv.replace("47,57,44", "47,abc,44");
        std::fs::write(&path, csv).unwrap();

        let err = StudentDataset::from_csv(&path).unwrap_err();
        match err {
            ChartError::Dataset(message) => assert!(message.contains("line 3")),
            other => panic!("expected Dataset error, got {other:?}"),
        }
    }

    #[test]
    fn high_share_groups_by_label() {
        let dataset = fixture();
        let by_gender = dataset.high_share_by(|row| &row.gender);
        assert_eq!(
            by_gender,
            vec![("female".to_string(), 100.0), ("male".to_string(), 0.0)]
        );
    }

    #[test]
    fn encoded_features_follow_schema_order() {
        let dataset = fixture();
        let mut encoders = EncoderSet::new();
        for column in CATEGORICAL_COLUMNS {
            let labels: Vec<&str> = match column {
                "gender" => vec!["female", "male"],
                "race/ethnicity" => vec!["group A", "group B", "group C"],
                "parental level of education" => {
                    vec!["bachelor's degree", "high school", "some college"]
                }
                "lunch" => vec!["free/reduced", "standard"],
                _ => vec!["completed", "none"],
            };
            encoders.insert(column, LabelEncoder::fit(labels));
        }

        let features = dataset.encoded_features(&encoders).unwrap();
        assert_eq!(features[0], vec![0.0, 1.0, 0.0, 1.0, 1.0, 72.0, 74.0]);
    }
}
