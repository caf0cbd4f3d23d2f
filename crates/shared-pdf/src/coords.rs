//! Coordinate transformation between page space and PDF user space
//!
//! Page space has its origin at the top-left of the page with y growing
//! downward. PDF user space has its origin at the bottom-left of the
//! MediaBox with y growing upward.

use shared_types::Rect;

/// US Letter MediaBox, used when a page does not declare one
pub const LETTER_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Convert a page-space rectangle to PDF `[llx, lly, urx, ury]`
pub fn page_to_pdf(rect: &Rect, media_box: [f64; 4]) -> [f64; 4] {
    let [mb_llx, _mb_lly, _mb_urx, mb_ury] = media_box;
    [
        mb_llx + rect.x0,
        mb_ury - rect.y1,
        mb_llx + rect.x1,
        mb_ury - rect.y0,
    ]
}

/// Convert PDF `[llx, lly, urx, ury]` back to a page-space rectangle
pub fn pdf_to_page(pdf_rect: [f64; 4], media_box: [f64; 4]) -> Rect {
    let [mb_llx, _mb_lly, _mb_urx, mb_ury] = media_box;
    let [llx, lly, urx, ury] = pdf_rect;
    Rect::new(llx - mb_llx, mb_ury - ury, urx - mb_llx, mb_ury - lly)
}

/// Highlight QuadPoints for a PDF rectangle: upper-left, upper-right,
/// lower-left, lower-right
pub fn quad_points(pdf_rect: [f64; 4]) -> [f64; 8] {
    let [llx, lly, urx, ury] = pdf_rect;
    [llx, ury, urx, ury, llx, lly, urx, lly]
}
