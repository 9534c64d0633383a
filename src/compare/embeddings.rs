// src/compare/embeddings.rs
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::utils::error::CapabilityError;

/// Maps a token to a fixed-length dense vector.
pub trait EmbeddingLookup {
    fn dimension(&self) -> usize;
    fn lookup(&self, token: &str) -> Option<&[f32]>;
}

/// Word vectors loaded from a GloVe or word2vec text file.
#[derive(Debug, Default)]
pub struct TextEmbeddings {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl TextEmbeddings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CapabilityError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CapabilityError::Embedding(format!("cannot open {}: {}", path.display(), e))
        })?;
        let embeddings = Self::from_reader(BufReader::new(file))?;
        tracing::info!(
            "Loaded {} embedding(s) of dimension {} from {}",
            embeddings.len(),
            embeddings.dimension,
            path.display()
        );
        Ok(embeddings)
    }

    /// Parses `word v1 v2 ...` lines. A leading `count dimension` header is skipped,
    /// and so is any line whose width disagrees with the first vector.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, CapabilityError> {
        let mut embeddings = Self::default();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CapabilityError::Embedding(e.to_string()))?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else { continue };
            let values: Result<Vec<f32>, _> = fields.map(str::parse::<f32>).collect();
            let Ok(values) = values else {
                tracing::warn!("Skipping unparsable embedding line {}", line_no + 1);
                continue;
            };

            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                continue; // word2vec header
            }
            if values.is_empty() {
                continue;
            }
            if embeddings.dimension == 0 {
                embeddings.dimension = values.len();
            } else if values.len() != embeddings.dimension {
                tracing::warn!(
                    "Skipping embedding line {}: width {} instead of {}",
                    line_no + 1,
                    values.len(),
                    embeddings.dimension
                );
                continue;
            }
            embeddings.vectors.insert(word.to_string(), values);
        }

        if embeddings.dimension == 0 {
            return Err(CapabilityError::Embedding("embedding file contains no vectors".to_string()));
        }
        Ok(embeddings)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

impl EmbeddingLookup for TextEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn lookup(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_glove_lines() {
        let data = "growth 0.5 1.0 -1.0\nloss -0.5 0.0 1.0\n";
        let embeddings = TextEmbeddings::from_reader(data.as_bytes()).unwrap();
        assert_eq!(embeddings.dimension(), 3);
        assert_eq!(embeddings.lookup("loss"), Some(&[-0.5f32, 0.0, 1.0][..]));
        assert_eq!(embeddings.lookup("profit"), None);
    }

    #[test]
    fn skips_word2vec_header_and_ragged_lines() {
        let data = "3 2\ncash 1 2\nflow 3\nrisk 0 1\n";
        let embeddings = TextEmbeddings::from_reader(data.as_bytes()).unwrap();
        assert_eq!(embeddings.dimension(), 2);
        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.lookup("flow").is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cloud 0.1 0.2").unwrap();
        let embeddings = TextEmbeddings::from_file(file.path()).unwrap();
        assert_eq!(embeddings.lookup("cloud"), Some(&[0.1f32, 0.2][..]));
    }

    #[test]
    fn empty_or_missing_files_are_errors() {
        assert!(TextEmbeddings::from_reader("".as_bytes()).is_err());
        assert!(TextEmbeddings::from_file("/definitely/not/here.txt").is_err());
    }
}
