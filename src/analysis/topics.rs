// src/analysis/topics.rs
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashMap;

use crate::config::TopicConfig;
use crate::utils::error::CapabilityError;

/// A fitted topic model.
pub trait TopicModel {
    /// Up to `n` topics as `(topic id, probability)`, most probable first.
    fn top_topics(&self, n: usize) -> Vec<(usize, f64)>;
    /// Up to `n` keywords of `topic` as `(term, probability)`, most probable first.
    fn top_keywords(&self, topic: usize, n: usize) -> Vec<(String, f64)>;
}

/// Fits a topic model over a corpus of token sequences.
pub trait TopicModeler {
    fn fit(&self, corpus: &[Vec<String>]) -> Result<Box<dyn TopicModel>, CapabilityError>;
}

/// Latent Dirichlet allocation estimated by collapsed Gibbs sampling.
pub struct LdaModeler {
    config: TopicConfig,
}

impl LdaModeler {
    pub fn new(config: TopicConfig) -> Self {
        Self { config }
    }
}

pub struct LdaModel {
    vocab: Vec<String>,
    /// topic x term assignment counts
    topic_term: Vec<Vec<usize>>,
    topic_totals: Vec<usize>,
    /// document x topic assignment counts
    doc_topic: Vec<Vec<usize>>,
    doc_lengths: Vec<usize>,
    alpha: f64,
    beta: f64,
}

impl TopicModeler for LdaModeler {
    fn fit(&self, corpus: &[Vec<String>]) -> Result<Box<dyn TopicModel>, CapabilityError> {
        let k = self.config.num_topics;
        if k == 0 {
            return Err(CapabilityError::Topic("num_topics must be at least 1".to_string()));
        }
        if !(self.config.alpha > 0.0 && self.config.beta > 0.0) {
            return Err(CapabilityError::Topic("alpha and beta must be positive".to_string()));
        }

        // Term ids in order of first appearance.
        let mut vocab: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut docs: Vec<Vec<usize>> = Vec::with_capacity(corpus.len());
        for doc in corpus {
            let mut ids = Vec::with_capacity(doc.len());
            for token in doc {
                let id = match index.get(token.as_str()) {
                    Some(&id) => id,
                    None => {
                        vocab.push(token.clone());
                        index.insert(token.as_str(), vocab.len() - 1);
                        vocab.len() - 1
                    }
                };
                ids.push(id);
            }
            docs.push(ids);
        }

        let token_count: usize = docs.iter().map(Vec::len).sum();
        if token_count == 0 {
            return Err(CapabilityError::Topic("cannot fit a topic model on an empty corpus".to_string()));
        }

        let v = vocab.len();
        let alpha = self.config.alpha;
        let beta = self.config.beta;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let mut topic_term = vec![vec![0usize; v]; k];
        let mut topic_totals = vec![0usize; k];
        let mut doc_topic = vec![vec![0usize; k]; docs.len()];

        let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(docs.len());
        for (d, doc) in docs.iter().enumerate() {
            let mut zs = Vec::with_capacity(doc.len());
            for &w in doc {
                let z = rng.gen_range(0..k);
                topic_term[z][w] += 1;
                topic_totals[z] += 1;
                doc_topic[d][z] += 1;
                zs.push(z);
            }
            assignments.push(zs);
        }

        let v_beta = v as f64 * beta;
        let mut weights = vec![0.0f64; k];
        for _ in 0..self.config.iterations {
            for (d, doc) in docs.iter().enumerate() {
                for (i, &w) in doc.iter().enumerate() {
                    let old = assignments[d][i];
                    topic_term[old][w] -= 1;
                    topic_totals[old] -= 1;
                    doc_topic[d][old] -= 1;

                    let mut total = 0.0;
                    for t in 0..k {
                        let weight = (doc_topic[d][t] as f64 + alpha)
                            * (topic_term[t][w] as f64 + beta)
                            / (topic_totals[t] as f64 + v_beta);
                        total += weight;
                        weights[t] = total;
                    }

                    let draw = rng.gen::<f64>() * total;
                    let new = weights.iter().position(|&cum| draw < cum).unwrap_or(k - 1);

                    assignments[d][i] = new;
                    topic_term[new][w] += 1;
                    topic_totals[new] += 1;
                    doc_topic[d][new] += 1;
                }
            }
        }

        tracing::debug!(
            "Fitted LDA: {} topic(s), {} term(s), {} token(s), {} sweep(s)",
            k,
            v,
            token_count,
            self.config.iterations
        );

        Ok(Box::new(LdaModel {
            vocab,
            topic_term,
            topic_totals,
            doc_lengths: docs.iter().map(Vec::len).collect(),
            doc_topic,
            alpha,
            beta,
        }))
    }
}

impl LdaModel {
    fn num_topics(&self) -> usize {
        self.topic_totals.len()
    }

    /// Topic proportions averaged over all documents.
    fn corpus_topic_distribution(&self) -> Vec<f64> {
        let k = self.num_topics();
        let mut distribution = vec![0.0; k];
        for (counts, &len) in self.doc_topic.iter().zip(&self.doc_lengths) {
            let denom = len as f64 + k as f64 * self.alpha;
            for (t, &c) in counts.iter().enumerate() {
                distribution[t] += (c as f64 + self.alpha) / denom;
            }
        }
        let docs = self.doc_topic.len().max(1) as f64;
        distribution.iter_mut().for_each(|p| *p /= docs);
        distribution
    }
}

impl TopicModel for LdaModel {
    fn top_topics(&self, n: usize) -> Vec<(usize, f64)> {
        let mut topics: Vec<(usize, f64)> =
            self.corpus_topic_distribution().into_iter().enumerate().collect();
        topics.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        topics.truncate(n);
        topics
    }

    fn top_keywords(&self, topic: usize, n: usize) -> Vec<(String, f64)> {
        let Some(counts) = self.topic_term.get(topic) else {
            return Vec::new();
        };
        let denom = self.topic_totals[topic] as f64 + self.vocab.len() as f64 * self.beta;

        let mut terms: Vec<usize> = (0..self.vocab.len()).collect();
        terms.sort_by(|&a, &b| counts[b].cmp(&counts[a]).then(a.cmp(&b)));
        terms
            .into_iter()
            .take(n)
            .map(|w| (self.vocab[w].clone(), (counts[w] as f64 + self.beta) / denom))
            .collect()
    }
}
