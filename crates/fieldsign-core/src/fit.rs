//! Aspect-preserving placement of a raster inside a destination box

use serde::{Deserialize, Serialize};

use crate::coords::DocumentBox;
use crate::error::SignError;

/// Final placement of an image, in document units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scale an image to fit inside a box, centering the leftover slack on both
/// axes. The aspect ratio is preserved and neither dimension exceeds the
/// box.
///
/// Zero image dimensions are rejected before dividing.
pub fn fit(img_width: u32, img_height: u32, bx: &DocumentBox) -> Result<FittedRect, SignError> {
    if img_width == 0 || img_height == 0 {
        return Err(SignError::InvalidRequest(format!(
            "signature image has degenerate dimensions {}x{}",
            img_width, img_height
        )));
    }

    let img_w = f64::from(img_width);
    let img_h = f64::from(img_height);

    let scale = (bx.width / img_w).min(bx.height / img_h);
    let width = img_w * scale;
    let height = img_h * scale;

    Ok(FittedRect {
        x: bx.x + (bx.width - width) / 2.0,
        y: bx.y + (bx.height - height) / 2.0,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x: f64, y: f64, w: f64, h: f64) -> DocumentBox {
        DocumentBox {
            page_index: 0,
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn wide_image_into_square_box() {
        // scale = min(200/400, 200/100) = 0.5
        let r = fit(400, 100, &bx(0.0, 0.0, 200.0, 200.0)).unwrap();
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 75.0);
        assert_eq!(r.width, 200.0);
        assert_eq!(r.height, 50.0);
    }

    #[test]
    fn tall_image_centers_horizontally() {
        let r = fit(100, 400, &bx(10.0, 20.0, 200.0, 200.0)).unwrap();
        assert_eq!(r.height, 200.0);
        assert_eq!(r.width, 50.0);
        assert_eq!(r.x, 10.0 + 75.0);
        assert_eq!(r.y, 20.0);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            fit(0, 100, &bx(0.0, 0.0, 10.0, 10.0)),
            Err(SignError::InvalidRequest(_))
        ));
        assert!(matches!(
            fit(100, 0, &bx(0.0, 0.0, 10.0, 10.0)),
            Err(SignError::InvalidRequest(_))
        ));
    }
}
