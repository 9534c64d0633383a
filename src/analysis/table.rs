// src/analysis/table.rs
use serde::Serialize;

use crate::analysis::sentiment::SentimentBreakdown;

/// Analysis results for one company's report in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub company: String,
    pub year: String,
    pub lexicon_sentiment: f64,
    pub lexicon_breakdown: SentimentBreakdown,
    pub transformer_sentiment: f64,
    pub positive_keyword_count: usize,
    pub negative_keyword_count: usize,
    /// `None` when neither keyword set occurs in the report.
    pub positive_ratio: Option<f64>,
    /// Top keywords of the report's most probable topic, space separated.
    pub top_topic: String,
}

/// Append-only accumulator for analysis records.
#[derive(Debug, Default)]
pub struct ResultTableBuilder {
    records: Vec<AnalysisRecord>,
}

impl ResultTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends without deduplication.
    pub fn append(&mut self, record: AnalysisRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn finish(self) -> ResultTable {
        ResultTable { records: self.records }
    }
}

/// Finished analysis results in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultTable {
    records: Vec<AnalysisRecord>,
}

impl ResultTable {
    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_company<'a>(&'a self, company: &'a str) -> impl Iterator<Item = &'a AnalysisRecord> + 'a {
        self.records.iter().filter(move |r| r.company == company)
    }

    /// Distinct companies in first-seen order.
    pub fn companies(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.company.as_str()) {
                seen.push(&record.company);
            }
        }
        seen
    }
}

#[cfg(test)]
pub(crate) fn record(company: &str, year: &str, top_topic: &str) -> AnalysisRecord {
    AnalysisRecord {
        company: company.to_string(),
        year: year.to_string(),
        lexicon_sentiment: 0.0,
        lexicon_breakdown: SentimentBreakdown::neutral(),
        transformer_sentiment: 0.0,
        positive_keyword_count: 0,
        negative_keyword_count: 0,
        positive_ratio: None,
        top_topic: top_topic.to_string(),
    }
}
