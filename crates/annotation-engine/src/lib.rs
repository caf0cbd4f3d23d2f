//! Quote location and annotation engine
//!
//! Locates quoted evidence passages in a document's page geometry and turns
//! each non-compliant requirement into a highlight, or into an entry on a
//! trailing summary page when the passage cannot be found.

pub mod config;
pub mod dispatcher;
pub mod evaluation;
pub mod locator;
pub mod merge;
pub mod normalize;
pub mod summary;

pub use config::{EngineConfig, LocatorConfig, Palette, RelevanceMode};
pub use dispatcher::{AnnotationOutcome, AnnotationPlan, Dispatcher};
pub use evaluation::{parse_evaluation, Evaluation, EvaluationError};
pub use locator::{PageMatch, QuoteLocator};
pub use merge::{merge_regions, MergeError};
pub use normalize::normalize;
pub use summary::render_summary;
