//! Coordinate transformation between UI and document coordinate systems
//!
//! The UI measures from the top-left in fractions of the rendered page; the
//! document measures from the bottom-left in its own fixed units. The page
//! units passed in here must come from the loaded document's actual page,
//! never an assumed default, or placement drifts whenever the true page size
//! differs.

use serde::{Deserialize, Serialize};

use crate::geometry::Field;

/// A rectangle in the document's native unit system, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentBox {
    /// 0-based page index.
    pub page_index: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Convert a field's relative rectangle into document units (flip Y axis).
pub fn to_document_box(field: &Field, page_width: f64, page_height: f64) -> DocumentBox {
    let x = field.x_rel * page_width;
    let width = field.w_rel * page_width;
    let top_y = field.y_rel * page_height;
    let height = field.h_rel * page_height;

    DocumentBox {
        page_index: field.page.saturating_sub(1),
        x,
        y: page_height - (top_y + height),
        width,
        height,
    }
}

/// Convert a document box back to top-left relative fractions.
pub fn to_relative(bx: &DocumentBox, page_width: f64, page_height: f64) -> (f64, f64, f64, f64) {
    let x_rel = bx.x / page_width;
    let w_rel = bx.width / page_width;
    let h_rel = bx.height / page_height;
    let y_rel = 1.0 - ((bx.y + bx.height) / page_height);
    (x_rel, y_rel, w_rel, h_rel)
}
