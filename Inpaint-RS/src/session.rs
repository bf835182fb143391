use std::path::Path;
use std::sync::Arc;

use crate::brush::{BrushController, DisplayRect};
use crate::client::InpaintClient;
use crate::error::{InpaintError, Result};
use crate::mask::MaskBuffer;
use crate::params::GenerationParameters;
use crate::poller::{JobPoller, PollHandle, PollState};
use crate::source::SourceImage;
use crate::types::{DeviceInfo, JobHandle, ResultImage};

/// One user's editing session: the uploaded image, the mask painted over
/// it, the generation settings, and at most one job being polled.
///
/// The session owns the mask exclusively. Pointer events must come from a
/// single thread of control; the job poll runs in the background on the
/// tokio runtime.
///
/// # Example
/// ```no_run
/// use inpaint_rs::{InpaintClient, InpaintConfig, InpaintSession};
/// use std::sync::Arc;
///
/// # async fn example(upload: Vec<u8>) -> inpaint_rs::Result<()> {
/// let client = Arc::new(InpaintClient::new(InpaintConfig::default()));
/// let mut session = InpaintSession::new(client);
///
/// session.load_image(upload)?;
/// session.pointer_down(120.0, 80.0);
/// session.pointer_move(140.0, 90.0);
/// session.pointer_up()?;
///
/// session.params_mut().prompt = "a red door".into();
/// session.submit().await?;
/// let images = session.wait_for_results().await?;
/// session.download_result(0, "result.png").await?;
/// # Ok(())
/// # }
/// ```
pub struct InpaintSession {
    client: Arc<InpaintClient>,
    source: Option<SourceImage>,
    mask: Option<MaskBuffer>,
    display: DisplayRect,
    brush: BrushController,
    params: GenerationParameters,
    mask_snapshot: Option<Vec<u8>>,
    poll: Option<PollHandle>,
    device_info: Option<DeviceInfo>,
}

impl InpaintSession {
    pub fn new(client: Arc<InpaintClient>) -> Self {
        Self {
            client,
            source: None,
            mask: None,
            display: DisplayRect::sized(0.0, 0.0),
            brush: BrushController::new(),
            params: GenerationParameters::default(),
            mask_snapshot: None,
            poll: None,
            device_info: None,
        }
    }

    pub fn client(&self) -> &Arc<InpaintClient> {
        &self.client
    }

    // ── Device ──────────────────────────────────────────────────────

    /// Refresh the cached device info. Failures are logged and leave the
    /// cache empty.
    pub async fn refresh_device_info(&mut self) -> Option<&DeviceInfo> {
        match self.client.device_info().await {
            Ok(info) => {
                log::info!("Inpainting service device: {}", info.describe());
                self.device_info = Some(info);
            }
            Err(e) => {
                log::warn!("Could not fetch device info: {}", e);
                self.device_info = None;
            }
        }
        self.device_info.as_ref()
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    // ── Image & mask ────────────────────────────────────────────────

    /// Replace the source image.
    ///
    /// Creates a fresh all-preserve mask of the new size, shows it unscaled,
    /// and stops polling any earlier job.
    pub fn load_image(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let source = SourceImage::from_bytes(bytes)?;
        let (w, h) = source.dimensions();
        log::info!("Loaded {}x{} {} image", w, h, source.mime_type());

        self.cancel();
        self.mask = Some(MaskBuffer::new(w, h));
        self.display = DisplayRect::sized(w as f32, h as f32);
        self.brush.cancel_gesture();
        self.mask_snapshot = None;
        self.source = Some(source);
        Ok(())
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn mask(&self) -> Option<&MaskBuffer> {
        self.mask.as_ref()
    }

    /// PNG of the mask as of the last finished stroke.
    pub fn mask_snapshot(&self) -> Option<&[u8]> {
        self.mask_snapshot.as_deref()
    }

    /// Tell the session where the mask is displayed, in pointer coordinates.
    pub fn set_display_rect(&mut self, display: DisplayRect) {
        self.display = display;
    }

    pub fn display_rect(&self) -> DisplayRect {
        self.display
    }

    /// Reset the mask to all-preserve. The buffer itself stays, so a
    /// submission with a blank mask is still possible.
    pub fn clear_mask(&mut self) {
        if let Some(mask) = self.mask.as_mut() {
            mask.clear();
        }
        self.brush.cancel_gesture();
        self.mask_snapshot = None;
    }

    // ── Brush ───────────────────────────────────────────────────────

    pub fn brush(&self) -> &BrushController {
        &self.brush
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush.set_brush_size(size);
    }

    /// Begin a stroke. Returns the stamped buffer point, or `None` with no image.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let mask = self.mask.as_mut()?;
        Some(self.brush.pointer_down(mask, &self.display, x, y))
    }

    /// Continue a stroke. Ignored when no stroke is active.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let mask = self.mask.as_mut()?;
        self.brush.pointer_move(mask, &self.display, x, y)
    }

    /// Finish the stroke and publish the mask snapshot.
    ///
    /// Returns `true` if a stroke was active.
    pub fn pointer_up(&mut self) -> Result<bool> {
        let Some(mask) = self.mask.as_ref() else {
            return Ok(false);
        };
        match self.brush.pointer_up(mask)? {
            Some(finished) => {
                self.mask_snapshot = Some(finished.mask_png);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The pointer left the canvas; ends the stroke like [`pointer_up`](Self::pointer_up).
    pub fn pointer_leave(&mut self) -> Result<bool> {
        self.pointer_up()
    }

    // ── Parameters ──────────────────────────────────────────────────

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut GenerationParameters {
        &mut self.params
    }

    pub fn set_params(&mut self, params: GenerationParameters) {
        self.params = params;
    }

    // ── Jobs ────────────────────────────────────────────────────────

    /// Snapshot the image and mask and submit them with the current
    /// parameters, then start polling the new job.
    ///
    /// Any poll still running from an earlier submission is cancelled first.
    ///
    /// # Errors
    ///
    /// - [`InpaintError::Validation`] if no image is loaded or the
    ///   parameters are out of range. Nothing is sent.
    /// - [`InpaintError::Submission`] if the service rejects the job.
    pub async fn submit(&mut self) -> Result<JobHandle> {
        let (Some(source), Some(mask)) = (self.source.as_ref(), self.mask.as_ref()) else {
            return Err(InpaintError::Validation(
                "Load an image and create a mask before submitting".into(),
            ));
        };
        self.params.validate()?;
        let image = source.bytes().to_vec();
        let mask_png = mask.encode()?;

        self.cancel();

        let job = self.client.submit(&image, &mask_png, &self.params).await?;
        let poller = JobPoller::new(Arc::clone(&self.client), self.client.config().poll_interval);
        self.poll = Some(poller.spawn(job.id.clone()));
        Ok(job)
    }

    /// State of the current job, `Idle` if none was submitted.
    pub fn poll_state(&self) -> PollState {
        self.poll
            .as_ref()
            .map(PollHandle::state)
            .unwrap_or(PollState::Idle)
    }

    pub fn poll_handle(&self) -> Option<&PollHandle> {
        self.poll.as_ref()
    }

    /// Wait for the current job and return its images.
    pub async fn wait_for_results(&self) -> Result<Vec<ResultImage>> {
        let poll = self
            .poll
            .as_ref()
            .ok_or_else(|| InpaintError::Validation("No job has been submitted".into()))?;
        poll.wait().await.into_result()
    }

    /// Results of the current job, once completed.
    pub fn results(&self) -> Option<Vec<ResultImage>> {
        match self.poll_state() {
            PollState::Completed { images, .. } => Some(images),
            _ => None,
        }
    }

    /// Stop polling the current job, if any.
    pub fn cancel(&mut self) {
        if let Some(poll) = self.poll.as_mut() {
            poll.cancel();
        }
    }

    /// Write result `index` of the completed job to `path`.
    pub async fn download_result(&self, index: usize, path: impl AsRef<Path>) -> Result<()> {
        let results = self
            .results()
            .ok_or_else(|| InpaintError::Validation("No completed results to download".into()))?;
        let result = results.get(index).ok_or_else(|| {
            InpaintError::Validation(format!(
                "Result {} out of range ({} available)",
                index,
                results.len()
            ))
        })?;
        let bytes = self.client.fetch_result_bytes(result).await?;
        std::fs::write(path.as_ref(), &bytes)?;
        log::info!(
            "Saved result {} (seed {}) to {}",
            index,
            result.seed,
            path.as_ref().display()
        );
        Ok(())
    }
}
