// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::ResultTable;
use crate::compare::SimilarityMatrix;
use crate::utils::error::StorageError;

const CSV_HEADER: [&str; 11] = [
    "company",
    "year",
    "lexicon_sentiment",
    "lexicon_positive",
    "lexicon_negative",
    "lexicon_neutral",
    "transformer_sentiment",
    "positive_keyword_count",
    "negative_keyword_count",
    "positive_ratio",
    "top_topic",
];

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Writes the result table as pretty JSON together with run metadata.
    pub fn save_table_json(&self, table: &ResultTable) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join("results.json");

        let document = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "record_count": table.len(),
            "records": table.records(),
        });
        let body = serde_json::to_string_pretty(&document)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, body).map_err(StorageError::IoError)?;

        tracing::info!("Saved results to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes one CSV row per record; an undefined ratio is an empty cell.
    pub fn save_table_csv(&self, table: &ResultTable) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join("results.csv");
        let csv_err = |e: csv::Error| StorageError::SerializationError(e.to_string());

        let mut writer = csv::Writer::from_path(&file_path).map_err(csv_err)?;
        writer.write_record(CSV_HEADER).map_err(csv_err)?;
        for r in table.iter() {
            writer
                .write_record([
                    r.company.clone(),
                    r.year.clone(),
                    r.lexicon_sentiment.to_string(),
                    r.lexicon_breakdown.positive.to_string(),
                    r.lexicon_breakdown.negative.to_string(),
                    r.lexicon_breakdown.neutral.to_string(),
                    r.transformer_sentiment.to_string(),
                    r.positive_keyword_count.to_string(),
                    r.negative_keyword_count.to_string(),
                    r.positive_ratio.map(|x| x.to_string()).unwrap_or_default(),
                    r.top_topic.clone(),
                ])
                .map_err(csv_err)?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved results to {}", file_path.display());
        Ok(file_path)
    }

    pub fn save_similarity(&self, matrix: &SimilarityMatrix) -> Result<PathBuf, StorageError> {
        let filename = format!("{}_similarity.json", matrix.company.to_uppercase());
        let file_path = self.base_dir.join(filename);

        let body = serde_json::to_string_pretty(matrix)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, body).map_err(StorageError::IoError)?;

        tracing::info!("Saved similarity matrix to {}", file_path.display());
        Ok(file_path)
    }
}
