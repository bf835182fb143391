use image::{GrayImage, ImageFormat, Luma};
use std::io::Cursor;

use crate::error::Result;

/// Luma value of a pixel the service must keep unchanged.
pub const PRESERVE: u8 = 255;

/// Luma value of a pixel the service should regenerate.
pub const REGENERATE: u8 = 0;

/// Decoded pixels darker than this count as "regenerate".
const THRESHOLD: u8 = 128;

/// Per-pixel directive carried by a [`MaskBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskPixel {
    Preserve,
    Regenerate,
}

impl MaskPixel {
    fn from_luma(value: u8) -> Self {
        if value < THRESHOLD {
            MaskPixel::Regenerate
        } else {
            MaskPixel::Preserve
        }
    }
}

/// Binary inpainting mask with the same pixel dimensions as the source image.
///
/// White pixels are preserved, black pixels are regenerated. Discs are
/// rasterized with a hard edge, so every pixel is exactly [`PRESERVE`] or
/// [`REGENERATE`].
///
/// # Example
/// ```
/// use inpaint_rs::MaskBuffer;
///
/// let mut mask = MaskBuffer::new(64, 64);
/// assert!(mask.is_blank());
///
/// mask.paint_disc(32.0, 32.0, 10.0);
/// assert!(!mask.is_blank());
///
/// let png = mask.encode().unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBuffer {
    pixels: GrayImage,
}

impl MaskBuffer {
    /// Create an all-preserve mask. Zero dimensions are raised to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width.max(1), height.max(1), Luma([PRESERVE])),
        }
    }

    /// Decode a mask from any supported image encoding, thresholding each
    /// pixel's luma at 128.
    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let mut pixels = image::load_from_memory(bytes)?.to_luma8();
        for p in pixels.pixels_mut() {
            p.0[0] = match MaskPixel::from_luma(p.0[0]) {
                MaskPixel::Preserve => PRESERVE,
                MaskPixel::Regenerate => REGENERATE,
            };
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Directive at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<MaskPixel> {
        self.pixels
            .get_pixel_checked(x, y)
            .map(|p| MaskPixel::from_luma(p.0[0]))
    }

    /// Mark every pixel whose center lies within `radius` of `(cx, cy)` as
    /// regenerate.
    ///
    /// Coordinates are in buffer pixel space. The center may lie outside the
    /// buffer; only the intersecting part of the disc is painted.
    pub fn paint_disc(&mut self, cx: f32, cy: f32, radius: f32) {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let (w, h) = self.dimensions();
        let (cx, cy, r) = (cx as f64, cy as f64, radius as f64);
        let r2 = r * r;

        // Pixel (px, py) covers [px, px+1); test its center.
        let x0 = (cx - r - 0.5).floor().max(0.0);
        let y0 = (cy - r - 0.5).floor().max(0.0);
        let x1 = (cx + r - 0.5).ceil().min(w as f64 - 1.0);
        let y1 = (cy + r - 0.5).ceil().min(h as f64 - 1.0);
        if x0 > x1 || y0 > y1 {
            return;
        }

        for py in y0 as u32..=y1 as u32 {
            let dy = py as f64 + 0.5 - cy;
            for px in x0 as u32..=x1 as u32 {
                let dx = px as f64 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.pixels.put_pixel(px, py, Luma([REGENERATE]));
                }
            }
        }
    }

    /// Reset every pixel to preserve.
    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            p.0[0] = PRESERVE;
        }
    }

    /// Number of pixels marked for regeneration.
    pub fn regenerate_count(&self) -> usize {
        self.pixels
            .as_raw()
            .iter()
            .filter(|&&v| v < THRESHOLD)
            .count()
    }

    /// True when nothing has been painted since creation or the last clear.
    pub fn is_blank(&self) -> bool {
        self.pixels.as_raw().iter().all(|&v| v >= THRESHOLD)
    }

    /// Lossless PNG snapshot of the current state.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// Borrow the underlying grayscale raster.
    pub fn as_gray_image(&self) -> &GrayImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside(px: u32, py: u32, cx: f32, cy: f32, r: f32) -> bool {
        let dx = px as f64 + 0.5 - cx as f64;
        let dy = py as f64 + 0.5 - cy as f64;
        dx * dx + dy * dy <= (r as f64) * (r as f64)
    }

    #[test]
    fn test_new_is_all_preserve() {
        for (w, h) in [(1, 1), (3, 7), (64, 48), (513, 257)] {
            let mask = MaskBuffer::new(w, h);
            assert_eq!(mask.dimensions(), (w, h));
            assert!(mask.is_blank());
            assert_eq!(mask.regenerate_count(), 0);
        }
    }

    #[test]
    fn test_zero_dimensions_raised() {
        let mask = MaskBuffer::new(0, 0);
        assert_eq!(mask.dimensions(), (1, 1));
    }

    #[test]
    fn test_encode_blank_decodes_white() {
        let mask = MaskBuffer::new(40, 30);
        let png = mask.encode().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert!(decoded.pixels().all(|p| p.0[0] == PRESERVE));
    }

    #[test]
    fn test_disc_paints_exactly_within_radius() {
        let mut mask = MaskBuffer::new(64, 64);
        let (cx, cy, r) = (30.3, 25.7, 9.5);
        mask.paint_disc(cx, cy, r);
        for y in 0..64 {
            for x in 0..64 {
                let expected = if inside(x, y, cx, cy, r) {
                    MaskPixel::Regenerate
                } else {
                    MaskPixel::Preserve
                };
                assert_eq!(mask.pixel(x, y), Some(expected), "pixel ({}, {})", x, y);
            }
        }
        assert!(mask.regenerate_count() > 0);
    }

    #[test]
    fn test_disc_is_idempotent() {
        let mut once = MaskBuffer::new(50, 50);
        once.paint_disc(20.0, 20.0, 10.0);
        let mut twice = once.clone();
        twice.paint_disc(20.0, 20.0, 10.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_disc_area_close_to_circle() {
        let mut mask = MaskBuffer::new(200, 200);
        mask.paint_disc(100.0, 100.0, 40.0);
        let area = std::f64::consts::PI * 40.0 * 40.0;
        let painted = mask.regenerate_count() as f64;
        assert!((painted - area).abs() / area < 0.02, "painted {} vs {}", painted, area);
    }

    #[test]
    fn test_out_of_bounds_center_paints_intersection() {
        let mut mask = MaskBuffer::new(20, 20);
        mask.paint_disc(-3.0, -3.0, 6.0);
        assert_eq!(mask.pixel(0, 0), Some(MaskPixel::Regenerate));
        assert_eq!(mask.pixel(10, 10), Some(MaskPixel::Preserve));

        let mut far = MaskBuffer::new(20, 20);
        far.paint_disc(500.0, 500.0, 10.0);
        assert!(far.is_blank());
    }

    #[test]
    fn test_degenerate_discs_ignored() {
        let mut mask = MaskBuffer::new(10, 10);
        mask.paint_disc(5.0, 5.0, 0.0);
        mask.paint_disc(5.0, 5.0, -2.0);
        mask.paint_disc(f32::NAN, 5.0, 3.0);
        mask.paint_disc(5.0, f32::INFINITY, 3.0);
        assert!(mask.is_blank());
    }

    #[test]
    fn test_clear_restores_initial_state() {
        let fresh = MaskBuffer::new(32, 24);
        let mut mask = fresh.clone();
        mask.paint_disc(5.0, 5.0, 4.0);
        mask.paint_disc(30.0, 20.0, 12.0);
        mask.paint_disc(-1.0, 23.0, 3.0);
        assert!(!mask.is_blank());
        mask.clear();
        assert_eq!(mask, fresh);
    }

    #[test]
    fn test_encode_decode_preserves_painting() {
        let mut mask = MaskBuffer::new(48, 32);
        mask.paint_disc(12.0, 12.0, 6.0);
        let decoded = MaskBuffer::from_png(&mask.encode().unwrap()).unwrap();
        assert_eq!(decoded, mask);
    }

    #[test]
    fn test_from_png_thresholds_gray() {
        let mut gray = GrayImage::from_pixel(4, 1, Luma([200]));
        gray.put_pixel(1, 0, Luma([127]));
        gray.put_pixel(2, 0, Luma([128]));
        gray.put_pixel(3, 0, Luma([10]));
        let mut buf = Cursor::new(Vec::new());
        gray.write_to(&mut buf, ImageFormat::Png).unwrap();

        let mask = MaskBuffer::from_png(&buf.into_inner()).unwrap();
        assert_eq!(mask.pixel(0, 0), Some(MaskPixel::Preserve));
        assert_eq!(mask.pixel(1, 0), Some(MaskPixel::Regenerate));
        assert_eq!(mask.pixel(2, 0), Some(MaskPixel::Preserve));
        assert_eq!(mask.pixel(3, 0), Some(MaskPixel::Regenerate));
        assert_eq!(mask.pixel(4, 0), None);
    }
}
