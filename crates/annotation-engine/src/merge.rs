//! Region merging
//!
//! Raw search hits are grouped into vertically contiguous blocks; the block
//! with the largest bounding area becomes the highlight. A multi-line quote
//! yields a tall block that outweighs a stray single-line hit from a short
//! snippet elsewhere on the page.

use shared_types::Rect;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("No rectangles to merge")]
    Empty,

    #[error("Rectangle with non-finite coordinates: {0:?}")]
    NonFiniteGeometry(Rect),
}

/// Group rectangles into vertically adjacent blocks, in top-to-bottom order.
///
/// Rectangles are sorted by `(y0, x0)`; each joins the current block when its
/// top edge is within `tolerance` of the block's bottom edge.
pub fn group_blocks(rects: &[Rect], tolerance: f64) -> Result<Vec<Rect>, MergeError> {
    if let Some(bad) = rects.iter().find(|r| !r.is_finite()) {
        return Err(MergeError::NonFiniteGeometry(*bad));
    }

    let mut sorted = rects.to_vec();
    sorted.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

    let mut blocks: Vec<Rect> = Vec::new();
    for rect in sorted {
        match blocks.last_mut() {
            Some(block) if block.vertical_gap_to(&rect) <= tolerance => {
                *block = block.union(&rect);
            }
            _ => blocks.push(rect),
        }
    }
    Ok(blocks)
}

/// Bounding box of the largest vertically contiguous block.
///
/// Ties go to the block nearest the top of the page.
pub fn merge_regions(rects: &[Rect], tolerance: f64) -> Result<Rect, MergeError> {
    let blocks = group_blocks(rects, tolerance)?;
    let mut best: Option<Rect> = None;
    for block in blocks {
        match best {
            Some(current) if block.area() <= current.area() => {}
            _ => best = Some(block),
        }
    }
    best.ok_or(MergeError::Empty)
}
