use std::time::Duration;

/// Interval between status queries for a running job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Configuration for talking to the inpainting service.
///
/// Use [`InpaintConfig::builder()`] for ergonomic construction, or
/// [`InpaintConfig::default()`] for a local service on port 8000.
#[derive(Debug, Clone)]
pub struct InpaintConfig {
    /// Base URL of the service, without a trailing slash.
    pub endpoint: String,

    /// Timeout for short requests (device info, status queries, downloads).
    pub request_timeout: Duration,

    /// Timeout for the `/inpaint` upload.
    pub submit_timeout: Duration,

    /// Delay between status queries while a job is pending.
    pub poll_interval: Duration,
}

impl Default for InpaintConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(60),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl InpaintConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> InpaintConfigBuilder {
        InpaintConfigBuilder::default()
    }

    /// Default config pointing at the given endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self::builder().with_endpoint(endpoint).build()
    }
}

pub(crate) fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Builder for [`InpaintConfig`].
#[derive(Default)]
pub struct InpaintConfigBuilder {
    config: InpaintConfig,
}

impl InpaintConfigBuilder {
    /// Set the service base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = normalize(endpoint.into());
        self
    }

    /// Set the timeout for short requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the timeout for job submission uploads.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.config.submit_timeout = timeout;
        self
    }

    /// Set the delay between status queries.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Build the final [`InpaintConfig`].
    pub fn build(self) -> InpaintConfig {
        self.config
    }
}
