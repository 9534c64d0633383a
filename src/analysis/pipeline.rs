// src/analysis/pipeline.rs
use std::collections::BTreeSet;

use crate::analysis::keywords::count_keywords;
use crate::analysis::sentiment::{transformer_score, ChunkScorer, LexiconScorer};
use crate::analysis::table::{AnalysisRecord, ResultTable, ResultTableBuilder};
use crate::analysis::text::{clean_text, tokenize};
use crate::analysis::topics::TopicModeler;
use crate::config::{AnalysisConfig, FailurePolicy};
use crate::reports::{AcquisitionKey, AcquisitionResult};
use crate::utils::error::CapabilityError;
use crate::utils::AppError;

/// Runs every per-document analysis and assembles one record per report.
///
/// Documents are analysed independently: each gets its own topic model and
/// sentiment calls, and nothing carries over between keys.
pub struct AnalysisPipeline {
    positive_keywords: BTreeSet<String>,
    negative_keywords: BTreeSet<String>,
    max_chunk_length: usize,
    num_keywords: usize,
    on_capability_error: FailurePolicy,
    lexicon: Box<dyn LexiconScorer>,
    transformer: Box<dyn ChunkScorer>,
    topics: Box<dyn TopicModeler>,
}

fn lowercased(keywords: &BTreeSet<String>) -> BTreeSet<String> {
    keywords.iter().map(|k| k.to_lowercase()).filter(|k| !k.is_empty()).collect()
}

impl AnalysisPipeline {
    pub fn new(
        config: &AnalysisConfig,
        lexicon: Box<dyn LexiconScorer>,
        transformer: Box<dyn ChunkScorer>,
        topics: Box<dyn TopicModeler>,
    ) -> Self {
        Self {
            positive_keywords: lowercased(&config.positive_keywords),
            negative_keywords: lowercased(&config.negative_keywords),
            max_chunk_length: config.max_chunk_length,
            num_keywords: config.topics.num_keywords,
            on_capability_error: config.on_capability_error,
            lexicon,
            transformer,
            topics,
        }
    }

    pub fn analyze(&self, key: &AcquisitionKey, text: &str) -> Result<AnalysisRecord, CapabilityError> {
        // Lexicon scoring sees the raw text; punctuation and casing carry signal for VADER.
        let (lexicon_sentiment, lexicon_breakdown) = self.lexicon.score(text)?;

        let cleaned = clean_text(text);
        let transformer_sentiment =
            transformer_score(self.transformer.as_ref(), &cleaned, self.max_chunk_length)?;

        let counts = count_keywords(&cleaned, &self.positive_keywords, &self.negative_keywords);
        let top_topic = self.top_topic(tokenize(text))?;

        tracing::debug!(
            "{}: lexicon {:.3}, transformer {:.3}, keywords +{}/-{}",
            key,
            lexicon_sentiment,
            transformer_sentiment,
            counts.positive,
            counts.negative
        );

        Ok(AnalysisRecord {
            company: key.company.clone(),
            year: key.year.clone(),
            lexicon_sentiment,
            lexicon_breakdown,
            transformer_sentiment,
            positive_keyword_count: counts.positive,
            negative_keyword_count: counts.negative,
            positive_ratio: counts.positive_ratio(),
            top_topic,
        })
    }

    /// Keywords of the most probable topic of a model fitted on this document alone.
    fn top_topic(&self, tokens: Vec<String>) -> Result<String, CapabilityError> {
        if tokens.is_empty() {
            return Ok(String::new());
        }
        let model = self.topics.fit(std::slice::from_ref(&tokens))?;
        let (topic, probability) = model
            .top_topics(1)
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::Topic("model reported no topics".to_string()))?;

        let keywords: Vec<String> = model
            .top_keywords(topic, self.num_keywords)
            .into_iter()
            .map(|(term, _)| term)
            .collect();
        tracing::trace!("Top topic {} (p = {:.3}): {:?}", topic, probability, keywords);
        Ok(keywords.join(" "))
    }

    /// Analyses every acquired report in driving order and collects the records.
    ///
    /// Capability failures skip the record or abort the batch per configuration.
    pub fn run(
        &self,
        acquired: &AcquisitionResult,
        companies: &BTreeSet<String>,
        years: &[String],
    ) -> Result<ResultTable, AppError> {
        let mut table = ResultTableBuilder::new();
        let mut skipped = 0usize;

        for key in acquired.ordered_keys(companies, years) {
            let Some(text) = acquired.get(&key) else { continue };

            match self.analyze(&key, text) {
                Ok(record) => {
                    tracing::info!("Analysed {}", key);
                    table.append(record);
                }
                Err(e) => match self.on_capability_error {
                    FailurePolicy::Skip => {
                        tracing::warn!("Skipping {}: {}", key, e);
                        skipped += 1;
                    }
                    FailurePolicy::Abort => {
                        tracing::error!("Aborting analysis at {}: {}", key, e);
                        return Err(AppError::Capability(e));
                    }
                },
            }
        }

        tracing::info!("Analysis finished. Records: {}, skipped: {}", table.len(), skipped);
        Ok(table.finish())
    }
}
