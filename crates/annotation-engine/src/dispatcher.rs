//! Annotation Dispatcher
//!
//! Runs every relevant, non-compliant request against a document's pages and
//! turns each into either a highlight or an unresolved record. The
//! dispatcher is the only component that instructs document mutation, and
//! it does so through an [`AnnotationSink`].

use crate::config::{EngineConfig, RelevanceMode, RequirementEntry};
use crate::locator::QuoteLocator;
use crate::summary::render_summary;
use serde::{Deserialize, Serialize};
use shared_types::{
    AnnotationRequest, AnnotationSink, ComplianceStatus, DocumentCategory, HighlightAction,
    LocatedRegion, PageSearch, UnresolvedRecord,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Highlights and unresolved records computed for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPlan {
    /// In application order: page, then top to bottom, then left to right
    pub highlights: Vec<HighlightAction>,
    pub unresolved: Vec<UnresolvedRecord>,
}

/// Result of annotating one document through a sink
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationOutcome {
    pub highlighted: usize,
    pub unresolved: Vec<UnresolvedRecord>,
    pub summary_page_added: bool,
}

enum Resolution {
    Highlight(HighlightAction),
    Unresolved(UnresolvedRecord),
}

/// A planned highlight and the record reported if the sink refuses it
struct PlannedHighlight {
    action: HighlightAction,
    fallback: UnresolvedRecord,
}

/// One engine instance serves any number of documents; it holds no
/// per-document state.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: EngineConfig,
    locator: QuoteLocator,
}

impl Dispatcher {
    pub fn new(config: EngineConfig) -> Self {
        let locator = QuoteLocator::new(config.locator.clone());
        Self { config, locator }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute highlights and unresolved records without touching a document
    pub fn plan<P: PageSearch>(
        &self,
        category: &DocumentCategory,
        pages: &[P],
        requests: &[AnnotationRequest],
    ) -> AnnotationPlan {
        let (highlights, unresolved) = self.plan_entries(category, pages, requests);
        AnnotationPlan {
            highlights: highlights.into_iter().map(|planned| planned.action).collect(),
            unresolved,
        }
    }

    fn plan_entries<P: PageSearch>(
        &self,
        category: &DocumentCategory,
        pages: &[P],
        requests: &[AnnotationRequest],
    ) -> (Vec<PlannedHighlight>, Vec<UnresolvedRecord>) {
        let table = self.config.requirement_index();
        let mut highlights = Vec::new();
        let mut unresolved = Vec::new();

        for request in requests {
            if !self.is_relevant(request, category, &table) {
                continue;
            }
            if request.status.is_compliant() {
                debug!("Skipping compliant requirement {}", request.id);
                continue;
            }
            match self.resolve(pages, request, &table) {
                Resolution::Highlight(action) => highlights.push(PlannedHighlight {
                    action,
                    fallback: UnresolvedRecord::from(request),
                }),
                Resolution::Unresolved(record) => unresolved.push(record),
            }
        }

        highlights.sort_by(|a, b| {
            let (a, b) = (&a.action, &b.action);
            a.page_index
                .cmp(&b.page_index)
                .then(a.rect.y0.total_cmp(&b.rect.y0))
                .then(a.rect.x0.total_cmp(&b.rect.x0))
        });
        (highlights, unresolved)
    }

    /// Annotate one document: add highlights through `sink`, then append a
    /// summary page if anything stayed unresolved.
    #[instrument(skip_all, fields(category = %category))]
    pub fn annotate<P: PageSearch, S: AnnotationSink + ?Sized>(
        &self,
        category: &DocumentCategory,
        pages: &[P],
        requests: &[AnnotationRequest],
        sink: &mut S,
    ) -> AnnotationOutcome {
        let (highlights, unresolved) = self.plan_entries(category, pages, requests);
        let mut outcome = AnnotationOutcome {
            unresolved,
            ..AnnotationOutcome::default()
        };

        for planned in highlights {
            match sink.add_highlight(&planned.action) {
                Ok(()) => outcome.highlighted += 1,
                Err(e) => {
                    warn!("Highlight for {} not applied: {}", planned.action.request_id, e);
                    outcome.unresolved.push(planned.fallback);
                }
            }
        }

        if !outcome.unresolved.is_empty() {
            let title = self.config.document_title(category);
            let text = render_summary(&title, &outcome.unresolved);
            match sink.append_summary_page(&text) {
                Ok(()) => outcome.summary_page_added = true,
                Err(e) => warn!("Skipping summary page: {}", e),
            }
        }

        info!(
            "Annotated {}: {} highlighted, {} unresolved",
            category,
            outcome.highlighted,
            outcome.unresolved.len()
        );
        outcome
    }

    fn is_relevant(
        &self,
        request: &AnnotationRequest,
        category: &DocumentCategory,
        table: &HashMap<&str, &RequirementEntry>,
    ) -> bool {
        let tag = request.target_document.as_ref().or_else(|| {
            table
                .get(request.id.as_str())
                .and_then(|entry| entry.document.as_ref())
        });
        if tag == Some(category) {
            return true;
        }
        self.config.relevance == RelevanceMode::IncludeFoundIn
            && request.found_in_document.as_ref() == Some(category)
    }

    fn resolve<P: PageSearch>(
        &self,
        pages: &[P],
        request: &AnnotationRequest,
        table: &HashMap<&str, &RequirementEntry>,
    ) -> Resolution {
        let mut region = None;
        if !request.key_quote.trim().is_empty() {
            region = self.first_page_hit(pages, &request.key_quote);
        }
        if region.is_none() {
            let phrases = table
                .get(request.id.as_str())
                .map(|entry| entry.fallback_phrases.as_slice())
                .unwrap_or(&[]);
            region = phrases
                .iter()
                .find_map(|phrase| self.first_page_hit(pages, phrase));
        }

        match region {
            Some(region) => {
                debug!(
                    "Located {} on page {} via {:?}",
                    request.id, region.page_index, region.stage
                );
                Resolution::Highlight(self.highlight_for(request, region))
            }
            None => {
                debug!("Could not locate {}", request.id);
                Resolution::Unresolved(UnresolvedRecord::from(request))
            }
        }
    }

    /// Scan pages in document order; the first page with a match wins
    fn first_page_hit<P: PageSearch>(&self, pages: &[P], quote: &str) -> Option<LocatedRegion> {
        pages.iter().enumerate().find_map(|(page_index, page)| {
            self.locator
                .locate(page, quote)
                .map(|found| LocatedRegion {
                    page_index,
                    rect: found.rect,
                    stage: found.stage,
                })
        })
    }

    fn highlight_for(&self, request: &AnnotationRequest, region: LocatedRegion) -> HighlightAction {
        HighlightAction {
            request_id: request.id.clone(),
            page_index: region.page_index,
            rect: region.rect,
            color: self.config.palette.color_for(request.status),
            opacity: self.config.palette.opacity,
            status: request.status,
            title: request.requirement.clone(),
            comment: comment_for(request),
        }
    }
}

/// Title plus the suggestion (partial) or the gap explanation (missing)
pub fn comment_for(request: &AnnotationRequest) -> String {
    let body = match request.status {
        ComplianceStatus::Partial => request
            .suggestion
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(request.details.as_str()),
        ComplianceStatus::Missing | ComplianceStatus::Compliant => request.details.as_str(),
    };
    let body = body.trim();
    if body.is_empty() {
        request.requirement.clone()
    } else {
        format!("{}: {}", request.requirement, body)
    }
}
