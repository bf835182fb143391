use crate::error::Result;
use crate::mask::MaskBuffer;

/// Default brush diameter in buffer pixels.
pub const DEFAULT_BRUSH_SIZE: f32 = 20.0;
/// Smallest brush diameter offered to the user.
pub const MIN_BRUSH_SIZE: f32 = 5.0;
/// Largest brush diameter offered to the user.
pub const MAX_BRUSH_SIZE: f32 = 100.0;

/// Where the mask is drawn on screen, in device pixels.
///
/// Pointer positions arrive in the same space as `left`/`top`; the
/// displayed mask may be scaled relative to the underlying buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rect anchored at the origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Map a device-space pointer position into buffer pixel space.
    ///
    /// Linear in both axes: `(left, top)` maps to `(0, 0)` and
    /// `(left + width, top + height)` maps to the buffer dimensions. A
    /// degenerate (zero or negative) display extent falls back to scale 1.
    pub fn to_buffer(&self, x: f32, y: f32, buffer: (u32, u32)) -> (f32, f32) {
        (
            scale_axis(x, self.left, self.width, buffer.0),
            scale_axis(y, self.top, self.height, buffer.1),
        )
    }
}

/// Multiply before dividing, in f64, so `origin + extent` lands exactly on `size`.
fn scale_axis(pos: f32, origin: f32, extent: f32, size: u32) -> f32 {
    let offset = pos as f64 - origin as f64;
    if extent > 0.0 {
        (offset * size as f64 / extent as f64) as f32
    } else {
        offset as f32
    }
}

/// Buffer-space points stamped during one pointer-down to pointer-up gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrushStroke {
    pub points: Vec<(f32, f32)>,
    pub brush_size: f32,
}

/// A completed gesture together with the mask snapshot taken when it ended.
#[derive(Debug, Clone)]
pub struct FinishedStroke {
    pub stroke: BrushStroke,
    /// PNG encoding of the whole mask after the stroke.
    pub mask_png: Vec<u8>,
}

/// Turns pointer gestures into disc stamps on a [`MaskBuffer`].
///
/// Only one gesture is tracked at a time. Strokes accumulate on the mask
/// until it is cleared; there is no undo.
#[derive(Debug, Clone)]
pub struct BrushController {
    brush_size: f32,
    active: Option<BrushStroke>,
}

impl Default for BrushController {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            active: None,
        }
    }
}

impl BrushController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brush diameter in buffer pixels.
    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Set the brush diameter, clamped to `[MIN_BRUSH_SIZE, MAX_BRUSH_SIZE]`.
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = if size.is_finite() {
            size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
        } else {
            DEFAULT_BRUSH_SIZE
        };
    }

    /// Whether a gesture is in progress.
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// The gesture in progress, if any.
    pub fn current_stroke(&self) -> Option<&BrushStroke> {
        self.active.as_ref()
    }

    /// Start a gesture and stamp the first disc. Returns the buffer point.
    ///
    /// A gesture already in progress is replaced; its stamps stay on the mask.
    pub fn pointer_down(
        &mut self,
        mask: &mut MaskBuffer,
        display: &DisplayRect,
        x: f32,
        y: f32,
    ) -> (f32, f32) {
        self.active = Some(BrushStroke {
            points: Vec::new(),
            brush_size: self.brush_size,
        });
        self.stamp(mask, display, x, y)
    }

    /// Drop the gesture in progress without exporting. Its stamps stay on the mask.
    pub fn cancel_gesture(&mut self) {
        self.active = None;
    }

    /// Stamp a disc if a gesture is active. Movement without a gesture is ignored.
    pub fn pointer_move(
        &mut self,
        mask: &mut MaskBuffer,
        display: &DisplayRect,
        x: f32,
        y: f32,
    ) -> Option<(f32, f32)> {
        if self.active.is_none() {
            return None;
        }
        Some(self.stamp(mask, display, x, y))
    }

    /// End the gesture and export the mask.
    ///
    /// Returns `None` when no gesture was active (e.g. the pointer left the
    /// canvas without pressing).
    pub fn pointer_up(&mut self, mask: &MaskBuffer) -> Result<Option<FinishedStroke>> {
        let Some(stroke) = self.active.take() else {
            return Ok(None);
        };
        let mask_png = mask.encode()?;
        log::debug!(
            "Stroke finished: {} stamp(s), {} pixel(s) marked",
            stroke.points.len(),
            mask.regenerate_count()
        );
        Ok(Some(FinishedStroke { stroke, mask_png }))
    }

    fn stamp(&mut self, mask: &mut MaskBuffer, display: &DisplayRect, x: f32, y: f32) -> (f32, f32) {
        let point = display.to_buffer(x, y, mask.dimensions());
        mask.paint_disc(point.0, point.1, self.brush_size / 2.0);
        if let Some(stroke) = self.active.as_mut() {
            stroke.points.push(point);
        }
        point
    }
}
