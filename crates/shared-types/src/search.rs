//! Collaborator seams: page text search and document mutation

use crate::geometry::Rect;
use crate::types::HighlightAction;
use thiserror::Error;

/// Flags passed through to a page search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFlags {
    pub case_insensitive: bool,
    /// A hyphen at a line break must not block a match spanning the break
    pub hyphen_tolerant: bool,
}

impl SearchFlags {
    /// Flags used for every quote lookup
    pub const QUOTE: SearchFlags = SearchFlags {
        case_insensitive: true,
        hyphen_tolerant: true,
    };

    pub const LITERAL: SearchFlags = SearchFlags {
        case_insensitive: false,
        hyphen_tolerant: false,
    };
}

impl Default for SearchFlags {
    fn default() -> Self {
        Self::QUOTE
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Page search failed: {0}")]
    Failed(String),

    #[error("Page search timed out")]
    Timeout,

    #[error("Page search returned malformed data: {0}")]
    Malformed(String),
}

/// Search primitive for one rendered page.
///
/// Returns one rectangle per contiguous run of matched text (one per line a
/// match spans). An empty list means no match.
pub trait PageSearch {
    fn search(&self, needle: &str, flags: SearchFlags) -> Result<Vec<Rect>, SearchError>;
}

impl<T: PageSearch + ?Sized> PageSearch for &T {
    fn search(&self, needle: &str, flags: SearchFlags) -> Result<Vec<Rect>, SearchError> {
        (**self).search(needle, flags)
    }
}

impl<T: PageSearch + ?Sized> PageSearch for Box<T> {
    fn search(&self, needle: &str, flags: SearchFlags) -> Result<Vec<Rect>, SearchError> {
        (**self).search(needle, flags)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Failed to add highlight: {0}")]
    Highlight(String),

    #[error("Failed to append summary page: {0}")]
    SummaryPage(String),
}

/// Receives document mutations from the dispatcher
pub trait AnnotationSink {
    fn add_highlight(&mut self, action: &HighlightAction) -> Result<(), SinkError>;

    /// Append one trailing page containing `text` as a literal block
    fn append_summary_page(&mut self, text: &str) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Rect>);

    impl PageSearch for Fixed {
        fn search(&self, _needle: &str, _flags: SearchFlags) -> Result<Vec<Rect>, SearchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_quote_flags_are_default() {
        assert_eq!(SearchFlags::default(), SearchFlags::QUOTE);
        assert!(SearchFlags::QUOTE.case_insensitive);
        assert!(SearchFlags::QUOTE.hyphen_tolerant);
    }

    #[test]
    fn test_search_through_references_and_boxes() {
        let page = Fixed(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let by_ref: &dyn PageSearch = &page;
        assert_eq!(by_ref.search("x", SearchFlags::QUOTE).unwrap().len(), 1);

        let boxed: Box<dyn PageSearch> = Box::new(Fixed(vec![]));
        assert!(boxed.search("x", SearchFlags::QUOTE).unwrap().is_empty());
    }
}
