use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{InpaintError, Result, JOB_FAILURE_FALLBACK};

/// Compute device reported by `GET /device-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `"cuda"` or `"cpu"`.
    pub device: String,
    #[serde(default)]
    pub gpu_name: Option<String>,
    #[serde(default)]
    pub gpu_vram_gb: Option<f64>,
}

impl DeviceInfo {
    pub fn is_gpu(&self) -> bool {
        self.device == "cuda"
    }

    /// One-line summary suitable for a status banner.
    pub fn describe(&self) -> String {
        if !self.is_gpu() {
            return "CPU mode: processing will be slower".to_string();
        }
        match (&self.gpu_name, self.gpu_vram_gb) {
            (Some(name), Some(vram)) => format!("GPU mode: {} ({:.1} GB VRAM)", name, vram),
            (Some(name), None) => format!("GPU mode: {}", name),
            _ => "GPU mode".to_string(),
        }
    }
}

/// Identifier of a job accepted by `POST /inpaint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
}

/// Job lifecycle as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a wire status. Anything other than `completed`/`failed`
    /// (including the service's own `processing`) is still in flight.
    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// One generated image from a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultImage {
    /// A `data:` URI or a plain URL.
    pub image: String,
    pub seed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Where a [`ResultImage`]'s bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Inline `data:<mime>;base64,<payload>`.
    DataUri { mime: &'a str, payload: &'a str },
    /// Must be fetched over HTTP.
    Url(&'a str),
}

/// Default file name for a downloaded result.
pub const RESULT_FILE_NAME: &str = "sd_inpainting_result.png";

impl ResultImage {
    /// Classify the `image` field.
    pub fn source(&self) -> ImageSource<'_> {
        let Some(rest) = self.image.strip_prefix("data:") else {
            return ImageSource::Url(&self.image);
        };
        match rest.split_once(',') {
            Some((meta, payload)) => ImageSource::DataUri {
                mime: meta.strip_suffix(";base64").unwrap_or(meta),
                payload,
            },
            None => ImageSource::DataUri {
                mime: "",
                payload: rest,
            },
        }
    }

    /// Decode an inline data URI into raw image bytes.
    ///
    /// # Errors
    ///
    /// [`InpaintError::Decode`] if the image is a URL or the payload is not
    /// valid base64.
    pub fn decode_data_uri(&self) -> Result<Vec<u8>> {
        match self.source() {
            ImageSource::DataUri { payload, .. } => base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| InpaintError::Decode(format!("Invalid base64 image payload: {}", e))),
            ImageSource::Url(url) => Err(InpaintError::Decode(format!(
                "Result image is a URL, not inline data: {}",
                url
            ))),
        }
    }
}

/// Body of `GET /inpaint/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub images: Option<Vec<ResultImage>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

/// Client-side record of one job, updated only from status responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Present once completed (possibly empty).
    pub results: Option<Vec<ResultImage>>,
    /// Present once failed.
    pub error: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            results: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fold a status response into the job.
    ///
    /// Returns `true` if this response moved the job into a terminal state.
    /// Responses arriving after that are ignored.
    pub fn apply(&mut self, response: StatusResponse) -> bool {
        if self.is_terminal() {
            return false;
        }
        match response.job_status() {
            JobStatus::Pending => false,
            JobStatus::Completed => {
                self.status = JobStatus::Completed;
                self.results = Some(response.images.unwrap_or_default());
                true
            }
            JobStatus::Failed => {
                self.status = JobStatus::Failed;
                self.error = Some(
                    response
                        .error
                        .filter(|e| !e.is_empty())
                        .unwrap_or_else(|| JOB_FAILURE_FALLBACK.to_string()),
                );
                true
            }
        }
    }

    /// Terminal outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self.status {
            JobStatus::Pending => None,
            JobStatus::Completed => Some(JobOutcome::Completed {
                images: self.results.clone().unwrap_or_default(),
            }),
            JobStatus::Failed => Some(JobOutcome::Failed {
                error: self
                    .error
                    .clone()
                    .unwrap_or_else(|| JOB_FAILURE_FALLBACK.to_string()),
            }),
        }
    }
}

/// How a polled job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The service finished; images may be empty.
    Completed { images: Vec<ResultImage> },
    /// The service reported a failure.
    Failed { error: String },
    /// Polling stopped before a terminal status was seen.
    Cancelled,
}

impl JobOutcome {
    /// Turn the outcome into a `Result`, mapping failure and cancellation to errors.
    pub fn into_result(self) -> Result<Vec<ResultImage>> {
        match self {
            JobOutcome::Completed { images } => Ok(images),
            JobOutcome::Failed { error } => Err(InpaintError::JobFailed(error)),
            JobOutcome::Cancelled => Err(InpaintError::Cancelled),
        }
    }
}
