// src/config.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::analysis::sentiment::SUPPORTED_SENTIMENT_MODEL;
use crate::utils::AppError;

const DEFAULT_POSITIVE_KEYWORDS: &[&str] = &[
    "growth",
    "profitable",
    "increase",
    "success",
    "strong",
    "improvement",
    "opportunity",
    "innovation",
];

const DEFAULT_NEGATIVE_KEYWORDS: &[&str] = &[
    "loss",
    "decline",
    "decrease",
    "risk",
    "challenge",
    "uncertainty",
    "weak",
    "impairment",
];

/// What to do when a sentiment, topic or embedding capability errors on one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and leave the document out of the result table.
    #[default]
    Skip,
    /// Stop the batch and surface the error.
    Abort,
}

/// Where and how annual reports are downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Exchange prefix used in hosted file names, e.g. `NASDAQ_AAPL_2022.pdf`.
    pub exchange: String,
    /// Reports for this year live under the current-reports path; older ones are archived.
    pub latest_year: String,
    pub request_timeout_secs: u64,
    /// Politeness delay before each request.
    pub request_delay_ms: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.annualreports.com".to_string(),
            exchange: "NASDAQ".to_string(),
            latest_year: "2022".to_string(),
            request_timeout_secs: 30,
            request_delay_ms: 100,
            user_agent: concat!("report_sentiment/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Parameters for the bundled LDA topic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub num_topics: usize,
    /// Keywords kept from the winning topic.
    pub num_keywords: usize,
    /// Gibbs sweeps over the corpus.
    pub iterations: usize,
    pub alpha: f64,
    pub beta: f64,
    pub seed: u64,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            num_topics: 5,
            num_keywords: 10,
            iterations: 50,
            alpha: 0.1,
            beta: 0.01,
            seed: 42,
        }
    }
}

/// Explicit configuration passed into acquisition and analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub positive_keywords: BTreeSet<String>,
    pub negative_keywords: BTreeSet<String>,
    pub sentiment_model_id: String,
    /// Path to a GloVe / word2vec text file.
    pub embedding_model_id: String,
    /// Maximum whitespace tokens per transformer chunk.
    pub max_chunk_length: usize,
    pub worker_pool_width: usize,
    pub source: SourceConfig,
    pub topics: TopicConfig,
    pub on_capability_error: FailurePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            positive_keywords: DEFAULT_POSITIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            negative_keywords: DEFAULT_NEGATIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            sentiment_model_id: SUPPORTED_SENTIMENT_MODEL.to_string(),
            embedding_model_id: "glove.6B.100d.txt".to_string(),
            max_chunk_length: 400,
            worker_pool_width: 5,
            source: SourceConfig::default(),
            topics: TopicConfig::default(),
            on_capability_error: FailurePolicy::default(),
        }
    }
}

impl AnalysisConfig {
    /// Loads a JSON config file; absent fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.worker_pool_width == 0 {
            return Err(AppError::Config("worker_pool_width must be at least 1".to_string()));
        }
        if self.max_chunk_length == 0 {
            return Err(AppError::Config("max_chunk_length must be at least 1".to_string()));
        }
        if self.topics.num_topics == 0 {
            return Err(AppError::Config("topics.num_topics must be at least 1".to_string()));
        }
        if self.positive_keywords.iter().chain(&self.negative_keywords).any(|k| k.is_empty()) {
            return Err(AppError::Config("keywords must not be empty strings".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_pool_width, 5);
        assert!(config.positive_keywords.contains("growth"));
        assert!(config.negative_keywords.contains("loss"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"worker_pool_width": 2, "source": {{"latest_year": "2023"}}, "on_capability_error": "abort"}}"#
        )
        .unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.worker_pool_width, 2);
        assert_eq!(config.source.latest_year, "2023");
        assert_eq!(config.source.exchange, "NASDAQ");
        assert_eq!(config.max_chunk_length, 400);
        assert_eq!(config.on_capability_error, FailurePolicy::Abort);
    }

    #[test]
    fn zero_width_pool_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"worker_pool_width": 0}}"#).unwrap();

        match AnalysisConfig::from_file(file.path()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("worker_pool_width")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
