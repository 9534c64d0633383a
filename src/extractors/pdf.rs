// src/extractors/pdf.rs
use lopdf::Document;

use crate::extractors::TextExtractor;
use crate::utils::error::ExtractError;

/// Page-by-page PDF text extraction backed by lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every page's text in page order, dropping pages without text
    /// and joining the rest with single spaces.
    pub fn extract_pages(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let document = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

        let mut pages = Vec::new();
        // get_pages is a BTreeMap keyed by page number, so iteration is in page order.
        for page_number in document.get_pages().keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        pages.push(text.to_string());
                    }
                }
                Err(e) => tracing::debug!("Skipping page {}: {}", page_number, e),
            }
        }

        if pages.is_empty() {
            return Err(ExtractError::NoText);
        }
        Ok(pages.join(" "))
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Option<String> {
        match self.extract_pages(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Text extraction failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Builds a PDF with one page per entry; an empty entry yields a page without text.
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn joins_pages_in_order_and_drops_empty_ones() {
        let bytes = build_pdf(&["Revenue grew", "", "Margins held"]);
        let text = PdfTextExtractor::new().extract(&bytes).unwrap();
        assert_eq!(text, "Revenue grew Margins held");
    }

    #[test]
    fn document_without_text_is_absent() {
        let bytes = build_pdf(&["", ""]);
        assert!(matches!(
            PdfTextExtractor::new().extract_pages(&bytes),
            Err(ExtractError::NoText)
        ));
        assert!(PdfTextExtractor::new().extract(&bytes).is_none());
    }

    #[test]
    fn malformed_bytes_fail_soft() {
        assert!(PdfTextExtractor::new().extract(b"<html>not a pdf</html>").is_none());
        assert!(PdfTextExtractor::new().extract(&[]).is_none());
    }
}
