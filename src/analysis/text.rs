// src/analysis/text.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_ALPHA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z]+").expect("Failed to compile NON_ALPHA_RE"));

const MIN_TOKEN_LEN: usize = 3;

// NLTK's English stopword list.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
        "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn",
        "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn", "also", "would",
    ]
    .into_iter()
    .collect()
});

/// Lowercases, replaces every non-letter run with one space and trims.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALPHA_RE.replace_all(&lowered, " ").trim().to_string()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Cleaned, stopword-free tokens of at least three letters, in document order.
pub fn tokenize(text: &str) -> Vec<String> {
    clean_text(text)
        .split_whitespace()
        .filter(|token| token.len() >= MIN_TOKEN_LEN && !is_stopword(token))
        .map(str::to_string)
        .collect()
}

/// Splits text into consecutive chunks of at most `max_tokens` whitespace tokens.
///
/// Tokens are never split, and joining the chunks with spaces reproduces the
/// input's token stream.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    chunk_text_with(text, max_tokens, |_| 1)
}

/// Packs whole words into chunks whose summed `word_len` stays within `max_len`.
///
/// `word_len` gives the cost of one word, e.g. its subword count under a model
/// tokenizer. A word that alone exceeds `max_len` becomes its own chunk.
pub fn chunk_text_with<F>(text: &str, max_len: usize, mut word_len: F) -> Vec<String>
where
    F: FnMut(&str) -> usize,
{
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let len = word_len(word);
        if !current.is_empty() && current_len + len > max_len {
            chunks.push(current.join(" "));
            current.clear();
            current_len = 0;
        }
        if len > max_len {
            tracing::warn!("Word of length {} exceeds chunk limit {}", len, max_len);
        }
        current.push(word);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}
