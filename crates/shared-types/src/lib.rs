pub mod geometry;
pub mod search;
pub mod types;

pub use geometry::Rect;
pub use search::{AnnotationSink, PageSearch, SearchError, SearchFlags, SinkError};
pub use types::{
    AnnotationRequest, ComplianceStatus, DocumentCategory, HighlightAction, LocatedRegion,
    MatchStage, Rgb, UnresolvedRecord,
};
