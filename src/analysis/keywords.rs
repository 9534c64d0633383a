// src/analysis/keywords.rs
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeywordCounts {
    pub positive: usize,
    pub negative: usize,
}

impl KeywordCounts {
    /// `positive / (positive + negative)`, undefined when neither keyword set occurs.
    pub fn positive_ratio(&self) -> Option<f64> {
        let total = self.positive + self.negative;
        if total == 0 {
            None
        } else {
            Some(self.positive as f64 / total as f64)
        }
    }
}

/// Counts non-overlapping substring occurrences of every keyword in `text`.
pub fn count_keywords(
    text: &str,
    positive: &BTreeSet<String>,
    negative: &BTreeSet<String>,
) -> KeywordCounts {
    let occurrences = |keywords: &BTreeSet<String>| -> usize {
        keywords
            .iter()
            .filter(|k| !k.is_empty())
            .map(|k| text.matches(k.as_str()).count())
            .sum()
    };

    KeywordCounts { positive: occurrences(positive), negative: occurrences(negative) }
}
