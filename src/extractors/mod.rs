// src/extractors/mod.rs
pub mod pdf;

pub use pdf::PdfTextExtractor;

/// Turns a downloaded document into one plain-text string.
///
/// Malformed input yields `None`; callers treat that like a missing report.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Option<String>;
}
