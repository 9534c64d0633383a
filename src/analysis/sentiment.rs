// src/analysis/sentiment.rs
use serde::Serialize;
use std::collections::HashMap;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::analysis::text::chunk_text_with;
use crate::utils::error::CapabilityError;

/// The transformer classifier this build knows how to load.
pub const SUPPORTED_SENTIMENT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";

/// Share of positive, negative and neutral tokens in a text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentBreakdown {
    pub fn neutral() -> Self {
        Self { positive: 0.0, negative: 0.0, neutral: 1.0 }
    }
}

/// Dictionary-based sentiment over a whole document.
pub trait LexiconScorer {
    /// Normalised score in `[-1, 1]`.
    fn compound(&self, text: &str) -> Result<f64, CapabilityError>;
    fn breakdown(&self, text: &str) -> Result<SentimentBreakdown, CapabilityError>;

    /// Compound score and breakdown together; override when one pass yields both.
    fn score(&self, text: &str) -> Result<(f64, SentimentBreakdown), CapabilityError> {
        Ok((self.compound(text)?, self.breakdown(text)?))
    }
}

/// Scores one chunk of bounded length, returning a value in `[-1, 1]`.
pub trait ChunkScorer {
    fn score_chunk(&self, chunk: &str) -> Result<f64, CapabilityError>;

    /// Input length of one word in the scorer's own units.
    fn token_len(&self, _word: &str) -> usize {
        1
    }

    /// Hard input limit of the underlying model, if any.
    fn max_input_tokens(&self) -> Option<usize> {
        None
    }
}

/// Rejects model ids this build cannot load instead of silently using another model.
pub fn ensure_supported_model(model_id: &str) -> Result<(), CapabilityError> {
    if model_id == SUPPORTED_SENTIMENT_MODEL {
        Ok(())
    } else {
        Err(CapabilityError::Sentiment(format!(
            "unsupported sentiment model '{}' (supported: {})",
            model_id, SUPPORTED_SENTIMENT_MODEL
        )))
    }
}

pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self { analyzer: SentimentIntensityAnalyzer::new() }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn finite(value: f64, what: &str) -> Result<f64, CapabilityError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CapabilityError::Sentiment(format!("VADER produced a non-finite {} score", what)))
    }
}

fn share(scores: &HashMap<&str, f64>, key: &str) -> Result<f64, CapabilityError> {
    finite(scores.get(key).copied().unwrap_or(0.0), key)
}

fn breakdown_from(scores: &HashMap<&str, f64>) -> Result<SentimentBreakdown, CapabilityError> {
    let positive = share(scores, "pos")?;
    let negative = share(scores, "neg")?;
    let neutral = share(scores, "neu")?;

    // VADER rounds each share, and reports all zeros when nothing was scored.
    let total = positive + negative + neutral;
    if total <= f64::EPSILON {
        return Ok(SentimentBreakdown::neutral());
    }
    Ok(SentimentBreakdown {
        positive: positive / total,
        negative: negative / total,
        neutral: neutral / total,
    })
}

impl LexiconScorer for VaderScorer {
    fn compound(&self, text: &str) -> Result<f64, CapabilityError> {
        Ok(self.score(text)?.0)
    }

    fn breakdown(&self, text: &str) -> Result<SentimentBreakdown, CapabilityError> {
        Ok(self.score(text)?.1)
    }

    fn score(&self, text: &str) -> Result<(f64, SentimentBreakdown), CapabilityError> {
        if text.trim().is_empty() {
            return Ok((0.0, SentimentBreakdown::neutral()));
        }
        let scores = self.analyzer.polarity_scores(text);
        Ok((share(&scores, "compound")?, breakdown_from(&scores)?))
    }
}

/// Stand-in for the transformer classifier: VADER's compound score per chunk.
pub struct LexiconChunkScorer {
    inner: VaderScorer,
}

impl LexiconChunkScorer {
    pub fn new() -> Self {
        Self { inner: VaderScorer::new() }
    }
}

impl Default for LexiconChunkScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkScorer for LexiconChunkScorer {
    fn score_chunk(&self, chunk: &str) -> Result<f64, CapabilityError> {
        self.inner.compound(chunk)
    }
}

/// Chunks `text`, scores each chunk and averages the scores.
///
/// Chunk length is measured with the scorer's `token_len` and capped by both
/// `max_chunk_length` and the scorer's own input limit. Text without any
/// token scores 0.
pub fn transformer_score(
    scorer: &dyn ChunkScorer,
    text: &str,
    max_chunk_length: usize,
) -> Result<f64, CapabilityError> {
    let limit = match scorer.max_input_tokens() {
        Some(model_limit) => max_chunk_length.min(model_limit),
        None => max_chunk_length,
    };
    let chunks = chunk_text_with(text, limit, |word| scorer.token_len(word));
    if chunks.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for chunk in &chunks {
        total += scorer.score_chunk(chunk)?;
    }
    tracing::trace!("Scored {} chunk(s) of at most {} tokens", chunks.len(), limit);
    Ok(total / chunks.len() as f64)
}

#[cfg(feature = "transformer")]
pub use bert::BertChunkScorer;

#[cfg(feature = "transformer")]
mod bert {
    use rust_bert::pipelines::sentiment::{SentimentModel, SentimentPolarity};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tokenizers::Tokenizer;

    use super::{ensure_supported_model, ChunkScorer};
    use crate::utils::error::CapabilityError;

    // Vocabulary shared with the SST-2 fine-tune.
    const TOKENIZER_ID: &str = "distilbert-base-uncased";
    // 512 positions minus [CLS] and [SEP].
    const MAX_INPUT_TOKENS: usize = 510;

    /// Signed rust-bert sentiment: `+score` for positive, `-score` for negative.
    pub struct BertChunkScorer {
        model: SentimentModel,
        tokenizer: Tokenizer,
        word_lengths: RefCell<HashMap<String, usize>>,
    }

    impl BertChunkScorer {
        pub fn new(model_id: &str) -> Result<Self, CapabilityError> {
            ensure_supported_model(model_id)?;
            tracing::info!("Loading transformer sentiment model ({})", model_id);
            let model = SentimentModel::new(Default::default())
                .map_err(|e| CapabilityError::Sentiment(e.to_string()))?;
            let tokenizer = Tokenizer::from_pretrained(TOKENIZER_ID, None)
                .map_err(|e| CapabilityError::Sentiment(format!("tokenizer: {}", e)))?;
            Ok(Self { model, tokenizer, word_lengths: RefCell::new(HashMap::new()) })
        }
    }

    impl ChunkScorer for BertChunkScorer {
        fn score_chunk(&self, chunk: &str) -> Result<f64, CapabilityError> {
            let prediction = self
                .model
                .predict(&[chunk])
                .into_iter()
                .next()
                .ok_or_else(|| CapabilityError::Sentiment("model returned no prediction".to_string()))?;

            Ok(match prediction.polarity {
                SentimentPolarity::Positive => prediction.score,
                SentimentPolarity::Negative => -prediction.score,
            })
        }

        /// Subword pieces of `word`; falls back to its character count, an upper bound.
        fn token_len(&self, word: &str) -> usize {
            if let Some(&len) = self.word_lengths.borrow().get(word) {
                return len;
            }
            let len = match self.tokenizer.encode(word, false) {
                Ok(encoding) => encoding.len(),
                Err(e) => {
                    tracing::debug!("Tokenizer failed on '{}': {}", word, e);
                    word.chars().count()
                }
            };
            self.word_lengths.borrow_mut().insert(word.to_string(), len);
            len
        }

        fn max_input_tokens(&self) -> Option<usize> {
            Some(MAX_INPUT_TOKENS)
        }
    }
}
