//! Recorded annotation operations
//!
//! An [`AnnotationLog`] collects what the dispatcher wants done to a
//! document without touching PDF bytes. The log serializes to JSON and is
//! replayed onto a PDF by [`crate::apply_operations`].

use serde::{Deserialize, Serialize};
use shared_types::{AnnotationSink, HighlightAction, SinkError};

pub type OpId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AnnotationOp {
    AddHighlight { id: OpId, action: HighlightAction },
    AppendSummaryPage { id: OpId, text: String },
}

impl AnnotationOp {
    pub fn id(&self) -> OpId {
        match self {
            AnnotationOp::AddHighlight { id, .. } => *id,
            AnnotationOp::AppendSummaryPage { id, .. } => *id,
        }
    }

    /// Zero-based target page, `None` for operations that add pages
    pub fn page_index(&self) -> Option<usize> {
        match self {
            AnnotationOp::AddHighlight { action, .. } => Some(action.page_index),
            AnnotationOp::AppendSummaryPage { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnnotationLog {
    next_id: OpId,
    operations: Vec<AnnotationOp>,
}

impl AnnotationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut op: AnnotationOp) -> OpId {
        let id = self.next_id;
        self.next_id += 1;

        match &mut op {
            AnnotationOp::AddHighlight { id: op_id, .. } => *op_id = id,
            AnnotationOp::AppendSummaryPage { id: op_id, .. } => *op_id = id,
        }

        self.operations.push(op);
        id
    }

    pub fn operations(&self) -> &[AnnotationOp] {
        &self.operations
    }

    pub fn highlights(&self) -> impl Iterator<Item = &HighlightAction> {
        self.operations.iter().filter_map(|op| match op {
            AnnotationOp::AddHighlight { action, .. } => Some(action),
            AnnotationOp::AppendSummaryPage { .. } => None,
        })
    }

    pub fn summary_pages(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().filter_map(|op| match op {
            AnnotationOp::AppendSummaryPage { text, .. } => Some(text.as_str()),
            AnnotationOp::AddHighlight { .. } => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl AnnotationSink for AnnotationLog {
    fn add_highlight(&mut self, action: &HighlightAction) -> Result<(), SinkError> {
        self.add(AnnotationOp::AddHighlight {
            id: 0,
            action: action.clone(),
        });
        Ok(())
    }

    fn append_summary_page(&mut self, text: &str) -> Result<(), SinkError> {
        self.add(AnnotationOp::AppendSummaryPage {
            id: 0,
            text: text.to_string(),
        });
        Ok(())
    }
}
