//! Shared PDF handling utilities
//!
//! Page text layers that answer phrase searches, coordinate conversion
//! between page space and PDF user space, and writing highlight
//! annotations and summary pages with lopdf.

pub mod apply_operations;
pub mod coords;
pub mod error;
pub mod operations;
pub mod text_layer;

pub use apply_operations::{apply_operations, PdfAnnotator};
pub use coords::{page_to_pdf, pdf_to_page};
pub use error::PdfAnnotateError;
pub use operations::{AnnotationLog, AnnotationOp, OpId};
pub use text_layer::{MonospaceLayout, TextLayer, TextSpan};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<usize, PdfAnnotateError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| PdfAnnotateError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rejects_garbage() {
        assert!(matches!(
            get_page_count(b"%PDF-garbage"),
            Err(PdfAnnotateError::ParseError(_))
        ));
    }
}
