// src/compare/mod.rs
pub mod embeddings;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analysis::ResultTable;
pub use embeddings::{EmbeddingLookup, TextEmbeddings};

/// Pairwise cosine similarity of one company's yearly topic vectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatrix {
    pub company: String,
    /// Row and column labels, ascending.
    pub years: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// `dot(u, v) / (|u| |v|)`, or 0 when either vector has zero norm.
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_u = 0.0f64;
    let mut norm_v = 0.0f64;
    for (&a, &b) in u.iter().zip(v) {
        let (a, b) = (a as f64, b as f64);
        dot += a * b;
        norm_u += a * a;
        norm_v += b * b;
    }

    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    dot / (norm_u.sqrt() * norm_v.sqrt())
}

/// Mean embedding of the whitespace-separated keywords.
///
/// Unknown words count as zero vectors; no words at all give the zero vector.
pub fn topic_vector(keywords: &str, lookup: &dyn EmbeddingLookup) -> Vec<f32> {
    let dimension = lookup.dimension();
    let mut sum = vec![0.0f32; dimension];
    let mut count = 0usize;

    for token in keywords.split_whitespace() {
        count += 1;
        match lookup.lookup(token) {
            Some(vector) => {
                for (acc, value) in sum.iter_mut().zip(vector) {
                    *acc += value;
                }
            }
            None => tracing::trace!("No embedding for '{}', using zero vector", token),
        }
    }

    if count > 0 {
        sum.iter_mut().for_each(|x| *x /= count as f32);
    }
    sum
}

/// Compares one company's topic keywords across every year in the table.
pub fn compare(company: &str, table: &ResultTable, lookup: &dyn EmbeddingLookup) -> SimilarityMatrix {
    let mut by_year: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in table.for_company(company) {
        by_year.entry(record.year.as_str()).or_default().push(record.top_topic.as_str());
    }

    let years: Vec<String> = by_year.keys().map(|y| y.to_string()).collect();
    let vectors: Vec<Vec<f32>> = by_year
        .values()
        .map(|topics| topic_vector(&topics.join(" "), lookup))
        .collect();

    let values = vectors
        .iter()
        .map(|u| vectors.iter().map(|v| cosine_similarity(u, v)).collect())
        .collect();

    tracing::info!("Compared {} year(s) of topics for {}", years.len(), company);
    SimilarityMatrix { company: company.to_string(), years, values }
}
