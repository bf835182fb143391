//! # inpaint-rs
//!
//! Async Rust client for a Stable Diffusion inpainting service.
//!
//! Paint a binary mask over an uploaded image, submit image + mask +
//! generation parameters as one multipart request, then poll the job until
//! the service reports it completed or failed.
//!
//! - [`MaskBuffer`]: owned monochrome raster, white = preserve, black = regenerate
//! - [`BrushController`]: pointer gestures to disc stamps, with display-to-buffer scaling
//! - [`InpaintClient`]: `/device-info`, `/inpaint`, `/inpaint/{id}`
//! - [`JobPoller`]: fixed-interval status polling with explicit cancellation
//! - [`InpaintSession`]: ties the pieces together for one editing session
//!
//! ## Quick Start
//!
//! ```no_run
//! use inpaint_rs::{InpaintClient, InpaintConfig, InpaintSession, JobOutcome};
//! use std::sync::Arc;
//!
//! # async fn example() -> inpaint_rs::Result<()> {
//! let client = Arc::new(InpaintClient::new(InpaintConfig::with_endpoint("http://127.0.0.1:8000")));
//! let mut session = InpaintSession::new(client);
//!
//! session.load_image(std::fs::read("photo.png")?)?;
//!
//! // Paint over the region to regenerate
//! session.set_brush_size(40.0);
//! session.pointer_down(200.0, 150.0);
//! session.pointer_move(260.0, 150.0);
//! session.pointer_up()?;
//!
//! session.params_mut().prompt = "an empty park bench".into();
//! let job = session.submit().await?;
//! println!("Submitted job {}", job.id);
//!
//! for (i, result) in session.wait_for_results().await?.iter().enumerate() {
//!     println!("Result {} (seed {})", i, result.seed);
//!     session.download_result(i, format!("result_{}.png", i)).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod brush;
pub mod client;
pub mod config;
pub mod error;
pub mod mask;
pub mod params;
pub mod poller;
pub mod session;
pub mod source;
pub mod types;

pub use brush::{BrushController, BrushStroke, DisplayRect, FinishedStroke};
pub use client::InpaintClient;
pub use config::{InpaintConfig, InpaintConfigBuilder};
pub use error::{InpaintError, Result};
pub use mask::{MaskBuffer, MaskPixel};
pub use params::GenerationParameters;
pub use poller::{JobPoller, PollHandle, PollState, StatusSource};
pub use session::InpaintSession;
pub use source::SourceImage;
pub use types::{
    DeviceInfo, ImageSource, Job, JobHandle, JobOutcome, JobStatus, ResultImage, StatusResponse,
};
