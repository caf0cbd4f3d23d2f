use shared_types::SinkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfAnnotateError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {0} not found")]
    PageNotFound(usize),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl From<lopdf::Error> for PdfAnnotateError {
    fn from(e: lopdf::Error) -> Self {
        PdfAnnotateError::OperationError(e.to_string())
    }
}

impl PdfAnnotateError {
    pub fn into_highlight_error(self) -> SinkError {
        SinkError::Highlight(self.to_string())
    }

    pub fn into_summary_error(self) -> SinkError {
        SinkError::SummaryPage(self.to_string())
    }
}
