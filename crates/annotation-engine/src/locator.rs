//! Quote Locator
//!
//! Finds where a quoted passage sits on one page, degrading through weaker
//! search stages when the verbatim text is not present:
//!
//! 1. the literal quote
//! 2. the whitespace-normalized quote
//! 3. shrinking word-prefix snippets of the quote
//!
//! The raw rectangles from the first successful stage are merged into one
//! highlight region.

use crate::config::LocatorConfig;
use crate::merge::merge_regions;
use crate::normalize::{normalize, words};
use shared_types::{MatchStage, PageSearch, Rect, SearchError, SearchFlags};
use tracing::{debug, warn};

/// A region found on one page and the stage that found it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMatch {
    pub rect: Rect,
    pub stage: MatchStage,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteLocator {
    config: LocatorConfig,
}

impl QuoteLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locate `quote` on `page`.
    ///
    /// Returns `None` for quotes below the length floor, when no stage
    /// matches, or when the page search fails or returns only non-finite
    /// rectangles.
    pub fn locate<P: PageSearch + ?Sized>(&self, page: &P, quote: &str) -> Option<PageMatch> {
        if quote.trim().chars().count() < self.config.min_quote_chars {
            return None;
        }

        match self.raw_matches(page, quote) {
            Ok(Some((stage, rects))) => Some(PageMatch {
                rect: self.merge_or_first(&rects)?,
                stage,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!("Search failed, treating page as no match: {}", e);
                None
            }
        }
    }

    /// Run the stages in order and return the first non-empty hit list
    fn raw_matches<P: PageSearch + ?Sized>(
        &self,
        page: &P,
        quote: &str,
    ) -> Result<Option<(MatchStage, Vec<Rect>)>, SearchError> {
        let rects = self.search_page(page, quote)?;
        if !rects.is_empty() {
            debug!("Exact match ({} rects)", rects.len());
            return Ok(Some((MatchStage::Exact, rects)));
        }

        let normalized = normalize(quote);
        if normalized.chars().count() >= self.config.min_normalized_chars {
            let rects = self.search_page(page, &normalized)?;
            if !rects.is_empty() {
                debug!("Normalized match ({} rects)", rects.len());
                return Ok(Some((MatchStage::Normalized, rects)));
            }
        }

        let quote_words = words(quote);
        for k in self.snippet_sizes(quote_words.len()) {
            let snippet = quote_words[..k].join(" ");
            let rects = self.search_page(page, &snippet)?;
            if !rects.is_empty() {
                debug!("Word-prefix match with {} words ({} rects)", k, rects.len());
                return Ok(Some((MatchStage::WordPrefix(k), rects)));
            }
        }

        Ok(None)
    }

    /// One search call with non-finite rectangles dropped. A hit list made
    /// only of non-finite rectangles is malformed.
    fn search_page<P: PageSearch + ?Sized>(
        &self,
        page: &P,
        needle: &str,
    ) -> Result<Vec<Rect>, SearchError> {
        let mut rects = page.search(needle, SearchFlags::QUOTE)?;
        let returned = rects.len();
        rects.retain(Rect::is_finite);
        if rects.len() < returned {
            if rects.is_empty() {
                return Err(SearchError::Malformed(format!(
                    "{} non-finite rectangles",
                    returned
                )));
            }
            warn!("Dropped {} non-finite rectangles", returned - rects.len());
        }
        Ok(rects)
    }

    /// Snippet sizes to try for a quote of `word_count` words, largest first
    fn snippet_sizes(&self, word_count: usize) -> Vec<usize> {
        let mut sizes: Vec<usize> = self
            .config
            .snippet_word_counts
            .iter()
            .copied()
            .filter(|&k| k <= word_count && k >= self.config.min_snippet_words && k > 0)
            .collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes.dedup();
        sizes
    }

    fn merge_or_first(&self, rects: &[Rect]) -> Option<Rect> {
        match merge_regions(rects, self.config.adjacency_tolerance) {
            Ok(rect) => Some(rect),
            Err(e) => {
                warn!("Region merge failed, using first match: {}", e);
                rects.first().copied()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Page that answers from a fixed phrase table and records every query
    struct ScriptedPage {
        hits: Vec<(&'static str, Vec<Rect>)>,
        queries: RefCell<Vec<String>>,
    }

    impl ScriptedPage {
        fn new(hits: Vec<(&'static str, Vec<Rect>)>) -> Self {
            Self {
                hits,
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSearch for ScriptedPage {
        fn search(&self, needle: &str, _flags: SearchFlags) -> Result<Vec<Rect>, SearchError> {
            self.queries.borrow_mut().push(needle.to_string());
            Ok(self
                .hits
                .iter()
                .find(|(phrase, _)| phrase.eq_ignore_ascii_case(needle))
                .map(|(_, rects)| rects.clone())
                .unwrap_or_default())
        }
    }

    struct FailingPage;

    impl PageSearch for FailingPage {
        fn search(&self, _needle: &str, _flags: SearchFlags) -> Result<Vec<Rect>, SearchError> {
            Err(SearchError::Timeout)
        }
    }

    fn line(y: f64) -> Rect {
        Rect::new(72.0, y, 540.0, y + 12.0)
    }

    #[test]
    fn test_short_quote_never_searched() {
        let page = ScriptedPage::new(vec![("abcd", vec![line(100.0)])]);
        let locator = QuoteLocator::default();
        assert_eq!(locator.locate(&page, "abcd"), None);
        assert_eq!(locator.locate(&page, ""), None);
        assert_eq!(locator.locate(&page, "   ab  "), None);
        assert!(page.queries.borrow().is_empty());
    }

    #[test]
    fn test_exact_stage_wins() {
        let quote = "The company shall maintain minimum capital";
        let page = ScriptedPage::new(vec![(quote, vec![line(200.0)])]);
        let found = QuoteLocator::default().locate(&page, quote).unwrap();
        assert_eq!(found.rect, line(200.0));
        assert_eq!(found.stage, MatchStage::Exact);
        assert_eq!(page.queries.borrow().len(), 1);
    }

    #[test]
    fn test_normalized_stage() {
        let quote = "customer data\nis stored   in Doha";
        let page = ScriptedPage::new(vec![("customer data is stored in Doha", vec![line(50.0)])]);
        let found = QuoteLocator::default().locate(&page, quote).unwrap();
        assert_eq!(found.stage, MatchStage::Normalized);
        assert_eq!(found.rect, line(50.0));
    }

    #[test]
    fn test_word_prefix_stage_with_eight_words() {
        // Nine words; only the first eight exist on the page
        let quote = "all transactions are monitored by the compliance officer daily";
        let prefix = "all transactions are monitored by the compliance officer";
        let page = ScriptedPage::new(vec![(prefix, vec![line(400.0)])]);

        let found = QuoteLocator::default().locate(&page, quote).unwrap();
        assert_eq!(found.stage, MatchStage::WordPrefix(8));
        assert_eq!(
            *page.queries.borrow(),
            vec![quote.to_string(), quote.to_string(), prefix.to_string()]
        );
    }

    #[test]
    fn test_word_prefix_prefers_longest_snippet() {
        let quote = "one two three four five six seven eight nine ten eleven twelve";
        let page = ScriptedPage::new(vec![
            ("one two three four five six seven eight nine ten", vec![line(10.0)]),
            ("one two three four five six", vec![line(300.0)]),
        ]);
        let found = QuoteLocator::default().locate(&page, quote).unwrap();
        assert_eq!(found.stage, MatchStage::WordPrefix(10));
        assert_eq!(found.rect, line(10.0));
    }

    #[test]
    fn test_short_word_count_skips_snippets() {
        // Five words: below the six-word floor, so no snippet stage
        let quote = "capital held in escrow account";
        let page = ScriptedPage::new(vec![]);
        assert_eq!(QuoteLocator::default().locate(&page, quote), None);
        assert_eq!(page.queries.borrow().len(), 2);
    }

    #[test]
    fn test_short_normalized_quote_skips_second_stage() {
        let quote = "AML  KYC";
        let page = ScriptedPage::new(vec![]);
        assert_eq!(QuoteLocator::default().locate(&page, quote), None);
        assert_eq!(page.queries.borrow().len(), 1);
    }

    #[test]
    fn test_snippet_match_merges_adjacent_lines() {
        let quote = "a b c d e f g h i j k l m n o p";
        let snippet = "a b c d e f g h i j k l m n o";
        let page = ScriptedPage::new(vec![(
            snippet,
            vec![line(600.0), line(100.0), line(114.0)],
        )]);
        let found = QuoteLocator::default().locate(&page, quote).unwrap();
        assert_eq!(found.stage, MatchStage::WordPrefix(15));
        assert_eq!(found.rect, Rect::new(72.0, 100.0, 540.0, 126.0));
    }

    #[test]
    fn test_non_finite_rects_are_no_match() {
        let quote = "evidence of segregation of client funds";
        let bad = Rect::new(f64::NAN, 0.0, 1.0, 1.0);
        let page = ScriptedPage::new(vec![(quote, vec![bad])]);
        assert_eq!(QuoteLocator::default().locate(&page, quote), None);
        // Malformed data ends the page; weaker stages are not tried
        assert_eq!(page.queries.borrow().len(), 1);
    }

    #[test]
    fn test_non_finite_rects_dropped_before_merge() {
        let quote = "evidence of segregation of client funds";
        let bad = Rect::new(f64::NAN, 0.0, 1.0, 1.0);
        let worse = Rect::new(0.0, f64::INFINITY, 1.0, 1.0);
        let page = ScriptedPage::new(vec![(quote, vec![bad, line(10.0), worse])]);
        let found = QuoteLocator::default().locate(&page, quote).unwrap();
        assert_eq!(found.rect, line(10.0));
        assert!(found.rect.is_finite());
        assert_eq!(found.stage, MatchStage::Exact);
    }

    #[test]
    fn test_search_failure_is_no_match() {
        assert_eq!(
            QuoteLocator::default().locate(&FailingPage, "a quote long enough"),
            None
        );
    }

    #[test]
    fn test_snippet_sizes_respect_floor_and_order() {
        let locator = QuoteLocator::new(LocatorConfig {
            snippet_word_counts: vec![6, 15, 4, 8, 10, 8],
            ..LocatorConfig::default()
        });
        assert_eq!(locator.snippet_sizes(12), vec![10, 8, 6]);
        assert_eq!(locator.snippet_sizes(20), vec![15, 10, 8, 6]);
        assert!(locator.snippet_sizes(5).is_empty());
    }
}
