use thiserror::Error;

/// Fallback message when `/inpaint` rejects a job without a `detail` field.
pub const SUBMISSION_FALLBACK: &str = "Failed to start inpainting job";

/// Fallback message when the service reports `failed` without an `error` field.
pub const JOB_FAILURE_FALLBACK: &str = "Unknown error";

/// Errors returned by inpainting operations.
#[derive(Error, Debug)]
pub enum InpaintError {
    /// Local precondition failed (missing image or mask, bad parameters).
    /// Never sent to the network.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The service refused to create the job, or the request never arrived.
    #[error("Submission failed: {message}")]
    Submission {
        status: Option<u16>,
        message: String,
    },

    /// A single status query failed. The poller retries these.
    #[error("Status query failed: {0}")]
    Polling(String),

    /// The service reported `status: "failed"` for the job.
    #[error("Inpainting job failed: {0}")]
    JobFailed(String),

    /// The poll was stopped before the job reached a terminal state.
    #[error("Polling was cancelled")]
    Cancelled,

    /// The service returned a non-success HTTP status.
    #[error("Inpainting service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// A result image could not be decoded from its data URI.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// Raster decode/encode failure.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Reading an upload or writing a downloaded result failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InpaintError {
    /// Build a `Submission` error from a non-2xx `/inpaint` response body.
    ///
    /// Uses the service's `detail` field when the body is JSON carrying one,
    /// otherwise [`SUBMISSION_FALLBACK`].
    pub fn from_submission_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("detail")
                    .and_then(|d| d.as_str())
                    .map(|s| s.to_string())
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SUBMISSION_FALLBACK.to_string());
        InpaintError::Submission {
            status: Some(status),
            message,
        }
    }

    /// True for errors the poller treats as transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InpaintError::Polling(_)
                | InpaintError::Network { .. }
                | InpaintError::Http { .. }
                | InpaintError::InvalidResponse(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, InpaintError>;
