//! Widget-space to image-space coordinate mapping.
//!
//! The display widget shows the image scaled to fit, aspect-preserving and
//! centered. This module contains the mapping math between widget pixels and
//! image pixels, extracted for testability.

/// Maps between widget pixels and image pixels for an aspect-fit, centered
/// image.
///
/// A mapper is a cheap value derived from the current widget and image sizes.
/// It must be rebuilt on every event dispatch; caching one across a widget
/// resize or an image switch yields stale scale/offset values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapper {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    image_width: f32,
    image_height: f32,
}

impl DisplayMapper {
    /// Build a mapper for the given widget size and image natural size.
    pub fn new(widget_w: f32, widget_h: f32, image_w: u32, image_h: u32) -> Self {
        let image_width = image_w.max(1) as f32;
        let image_height = image_h.max(1) as f32;
        let scale = (widget_w / image_width).min(widget_h / image_height);
        Self {
            scale,
            offset_x: (widget_w - image_width * scale) / 2.0,
            offset_y: (widget_h - image_height * scale) / 2.0,
            image_width,
            image_height,
        }
    }

    /// The uniform scale factor applied to the image.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Natural image size in pixels.
    pub fn image_size(&self) -> (f32, f32) {
        (self.image_width, self.image_height)
    }

    /// Convert a widget point to image-pixel coordinates.
    ///
    /// Returns `None` when the point falls outside the displayed image
    /// rectangle; out-of-bounds input is rejected, never clamped.
    pub fn to_image(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        let ix = (px - self.offset_x) / self.scale;
        let iy = (py - self.offset_y) / self.scale;
        if ix >= 0.0 && ix < self.image_width && iy >= 0.0 && iy < self.image_height {
            Some((ix, iy))
        } else {
            None
        }
    }

    /// Convert a widget point to normalized `[0, 1]` image coordinates.
    pub fn to_image_norm(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        self.to_image(px, py)
            .map(|(ix, iy)| (ix / self.image_width, iy / self.image_height))
    }

    /// Convert image-pixel coordinates back to widget coordinates.
    /// Used for rendering overlays on top of the scaled image.
    pub fn to_display(&self, ix: f32, iy: f32) -> (f32, f32) {
        (
            ix * self.scale + self.offset_x,
            iy * self.scale + self.offset_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_when_sizes_match() {
        let m = DisplayMapper::new(100.0, 100.0, 100, 100);
        assert_eq!(m.scale(), 1.0);
        assert_eq!(m.to_image(10.0, 20.0), Some((10.0, 20.0)));
    }

    #[test]
    fn test_letterbox_offsets() {
        // 200x100 widget, 100x100 image: scale 1, centered horizontally.
        let m = DisplayMapper::new(200.0, 100.0, 100, 100);
        assert_eq!(m.scale(), 1.0);
        assert_eq!(m.to_display(0.0, 0.0), (50.0, 0.0));
        assert_eq!(m.to_image(50.0, 0.0), Some((0.0, 0.0)));
        // A click in the left letterbox band is outside the image.
        assert_eq!(m.to_image(10.0, 50.0), None);
    }

    #[test]
    fn test_downscale_wide_image() {
        // 400x200 image shown in a 200x200 widget: scale 0.5, centered vertically.
        let m = DisplayMapper::new(200.0, 200.0, 400, 200);
        assert!(approx_eq(m.scale(), 0.5));
        let (ix, iy) = m.to_image(100.0, 100.0).unwrap();
        assert!(approx_eq(ix, 200.0));
        assert!(approx_eq(iy, 100.0));
    }

    #[test]
    fn test_round_trip_inside_image() {
        let m = DisplayMapper::new(317.0, 211.0, 640, 480);
        for &(px, py) in &[(100.0, 100.0), (158.5, 105.5), (60.25, 90.75)] {
            let (ix, iy) = m.to_image(px, py).expect("point inside image");
            let (bx, by) = m.to_display(ix, iy);
            assert!(approx_eq(bx, px), "x: {} vs {}", bx, px);
            assert!(approx_eq(by, py), "y: {} vs {}", by, py);
        }
    }

    #[test]
    fn test_outside_rejected_not_clamped() {
        let m = DisplayMapper::new(100.0, 100.0, 100, 100);
        assert_eq!(m.to_image(-1.0, 50.0), None);
        assert_eq!(m.to_image(50.0, 100.5), None);
        assert_eq!(m.to_image(150.0, 150.0), None);
    }

    #[test]
    fn test_normalized_coordinates() {
        let m = DisplayMapper::new(100.0, 100.0, 100, 100);
        let (nx, ny) = m.to_image_norm(20.0, 40.0).unwrap();
        assert!(approx_eq(nx, 0.2));
        assert!(approx_eq(ny, 0.4));
    }

    #[test]
    fn test_rebuild_reflects_resize() {
        let before = DisplayMapper::new(100.0, 100.0, 100, 100);
        let after = DisplayMapper::new(200.0, 200.0, 100, 100);
        assert_ne!(before, after);
        assert!(approx_eq(after.scale(), 2.0));
    }
}
