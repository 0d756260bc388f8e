//! Resolution-independent field geometry
//!
//! Fields are stored purely as fractions of the rendered page size, so the
//! viewer can re-render at any pixel dimensions and reproduce an identical
//! placement. Pixel coordinates only appear at the edges of this module,
//! where UI gestures hand in already-computed deltas.

use serde::{Deserialize, Serialize};

/// Default field size when dropped: 20% of container width, 5% of height.
const DEFAULT_WIDTH_FRAC: f64 = 0.2;
const DEFAULT_HEIGHT_FRAC: f64 = 0.05;

/// Minimum field size in pixels, applied before conversion to fractions so
/// a resize gesture can never produce a degenerate or negative box.
const MIN_WIDTH_PX: f64 = 20.0;
const MIN_HEIGHT_PX: f64 = 16.0;

/// Kind of a placed annotation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Signature,
    Stamp,
    Date,
}

/// A placed field, positioned as fractions of the rendered page.
///
/// Coordinates are top-left origin and deliberately unclamped: a field may
/// be dragged partially or fully off the visible page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: u64,
    pub kind: FieldKind,
    /// 1-based page index.
    pub page: u32,
    pub x_rel: f64,
    pub y_rel: f64,
    pub w_rel: f64,
    pub h_rel: f64,
}

impl Field {
    /// Reconstruct the pixel rectangle at a given container size.
    pub fn to_pixels(&self, container_w: f64, container_h: f64) -> (f64, f64, f64, f64) {
        (
            self.x_rel * container_w,
            self.y_rel * container_h,
            self.w_rel * container_w,
            self.h_rel * container_h,
        )
    }
}

/// Owns the fields of one editing session and allocates their ids.
///
/// The id sequence is session-local; discarding the session discards the
/// fields, there is no persistence across sessions.
#[derive(Debug, Default)]
pub struct PlacementSession {
    fields: Vec<Field>,
    next_id: u64,
}

impl PlacementSession {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            next_id: 1,
        }
    }

    /// Place a new field at a pixel position inside the container.
    ///
    /// Returns `None` without placing anything when either container
    /// dimension is zero, since the fractions would be undefined.
    pub fn place(
        &mut self,
        kind: FieldKind,
        page: u32,
        x_px: f64,
        y_px: f64,
        container_w: f64,
        container_h: f64,
    ) -> Option<&Field> {
        if container_w == 0.0 || container_h == 0.0 {
            return None;
        }

        let field = Field {
            id: self.next_id,
            kind,
            page,
            x_rel: x_px / container_w,
            y_rel: y_px / container_h,
            w_rel: DEFAULT_WIDTH_FRAC,
            h_rel: DEFAULT_HEIGHT_FRAC,
        };
        self.next_id += 1;
        self.fields.push(field);
        self.fields.last()
    }

    /// Move a field by a pixel delta. No clamping to the page.
    pub fn reposition(
        &mut self,
        id: u64,
        dx_px: f64,
        dy_px: f64,
        container_w: f64,
        container_h: f64,
    ) -> Option<&Field> {
        if container_w == 0.0 || container_h == 0.0 {
            return None;
        }

        let field = self.fields.iter_mut().find(|f| f.id == id)?;
        field.x_rel += dx_px / container_w;
        field.y_rel += dy_px / container_h;
        Some(field)
    }

    /// Grow or shrink a field by a pixel delta, floored at the minimum
    /// pixel size before converting back to fractions.
    pub fn resize(
        &mut self,
        id: u64,
        dw_px: f64,
        dh_px: f64,
        container_w: f64,
        container_h: f64,
    ) -> Option<&Field> {
        if container_w == 0.0 || container_h == 0.0 {
            return None;
        }

        let field = self.fields.iter_mut().find(|f| f.id == id)?;
        let new_w_px = (field.w_rel * container_w + dw_px).max(MIN_WIDTH_PX);
        let new_h_px = (field.h_rel * container_h + dh_px).max(MIN_HEIGHT_PX);
        field.w_rel = new_w_px / container_w;
        field.h_rel = new_h_px / container_h;
        Some(field)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: u64) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }
}
