use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

use crate::config::InpaintConfig;
use crate::error::{InpaintError, Result};
use crate::params::GenerationParameters;
use crate::poller::JobPoller;
use crate::types::*;

const IMAGE_FILE_NAME: &str = "image.png";
const MASK_FILE_NAME: &str = "mask.png";

/// Async client for the inpainting service.
///
/// Covers device discovery, job submission, status queries, and result
/// download. Polling until a job finishes is handled by [`JobPoller`].
///
/// # Example
/// ```no_run
/// use inpaint_rs::{GenerationParameters, InpaintClient, InpaintConfig};
/// use std::sync::Arc;
///
/// # async fn example(image: Vec<u8>, mask: Vec<u8>) -> inpaint_rs::Result<()> {
/// let client = Arc::new(InpaintClient::new(InpaintConfig::with_endpoint("http://127.0.0.1:8000")));
/// let params = GenerationParameters::new("a stone wall");
///
/// let job = client.submit(&image, &mask, &params).await?;
/// let images = client.wait_for_completion(&job.id).await.into_result()?;
/// println!("{} result(s)", images.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InpaintClient {
    http: Client,
    config: InpaintConfig,
}

impl InpaintClient {
    /// Create a client from an explicit configuration.
    pub fn new(config: InpaintConfig) -> Self {
        let config = InpaintConfig {
            endpoint: crate::config::normalize(config.endpoint),
            ..config
        };
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &InpaintConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint, path)
    }

    fn connect_context(&self) -> String {
        format!(
            "Cannot connect to the inpainting service at {} (is it running?)",
            self.config.endpoint
        )
    }

    // ── Device ──────────────────────────────────────────────────────

    /// Check whether the service answers `/device-info`.
    pub async fn health(&self) -> Result<bool> {
        let resp = self
            .http
            .get(self.url("/device-info"))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| InpaintError::Network {
                context: self.connect_context(),
                source: e,
            })?;
        Ok(resp.status().is_success())
    }

    /// Fetch the compute device the service runs on.
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        let resp = self
            .http
            .get(self.url("/device-info"))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| InpaintError::Network {
                context: self.connect_context(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InpaintError::Http { status, body });
        }

        resp.json().await.map_err(|e| InpaintError::Network {
            context: "Failed to parse /device-info response".into(),
            source: e,
        })
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Upload an image, its mask, and the generation parameters as one
    /// multipart request. Returns the new job's handle.
    ///
    /// Nothing is retried. A 307/308 redirect (the service may move
    /// `/inpaint` to `/inpaint/`) is followed once with the same form.
    ///
    /// # Errors
    ///
    /// - [`InpaintError::Validation`] for empty image/mask bytes or
    ///   out-of-range parameters (nothing is sent).
    /// - [`InpaintError::Submission`] when the request fails or the service
    ///   answers with a non-2xx status.
    pub async fn submit(
        &self,
        image: &[u8],
        mask: &[u8],
        params: &GenerationParameters,
    ) -> Result<JobHandle> {
        if image.is_empty() {
            return Err(InpaintError::Validation("Source image is empty".into()));
        }
        if mask.is_empty() {
            return Err(InpaintError::Validation("Mask image is empty".into()));
        }
        params.validate()?;

        log::info!(
            "Submitting inpainting job to {} ({} byte image, {} byte mask, {} output(s))",
            self.config.endpoint,
            image.len(),
            mask.len(),
            params.num_outputs
        );

        let mut resp = self
            .post_form(self.url("/inpaint"), image, mask, params)
            .await?;

        // reqwest won't replay a multipart body; resend once on 307/308.
        if let Some(target) = redirect_target(&resp) {
            log::debug!("Submission redirected to {}", target);
            resp = self.post_form(target, image, mask, params).await?;
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let err = InpaintError::from_submission_body(status, &body);
            log::warn!("Inpainting job rejected with HTTP {}: {}", status, err);
            return Err(err);
        }

        let json: Value = resp.json().await.map_err(|e| InpaintError::Submission {
            status: None,
            message: format!("Failed to parse /inpaint response: {}", e),
        })?;

        let id = json
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| InpaintError::InvalidResponse("Response missing job id".into()))?;

        log::info!("Inpainting job {} accepted", id);
        Ok(JobHandle { id })
    }

    async fn post_form(
        &self,
        url: impl reqwest::IntoUrl,
        image: &[u8],
        mask: &[u8],
        params: &GenerationParameters,
    ) -> Result<reqwest::Response> {
        let form = build_form(image, mask, params)?;
        self.http
            .post(url)
            .timeout(self.config.submit_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InpaintError::Submission {
                status: None,
                message: format!("{}: {}", self.connect_context(), e),
            })
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Query a job's status once.
    ///
    /// Every failure is reported as [`InpaintError::Polling`], which the
    /// poller treats as transient.
    pub async fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let resp = self
            .http
            .get(self.job_url(job_id)?)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| InpaintError::Polling(format!("{}: {}", self.connect_context(), e)))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InpaintError::Polling(format!(
                "HTTP {} for job {}: {}",
                status, job_id, body
            )));
        }

        resp.json()
            .await
            .map_err(|e| InpaintError::Polling(format!("Failed to parse status for job {}: {}", job_id, e)))
    }

    /// `{endpoint}/inpaint/{job_id}`, with the id escaped as one path segment.
    fn job_url(&self, job_id: &str) -> Result<reqwest::Url> {
        let invalid = || InpaintError::Polling(format!("Invalid endpoint {}", self.config.endpoint));
        let mut url = reqwest::Url::parse(&self.config.endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("inpaint")
            .push(job_id);
        Ok(url)
    }

    /// List the ids of every job the service is tracking.
    pub async fn list_jobs(&self) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(self.url("/inpaint/"))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| InpaintError::Network {
                context: self.connect_context(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InpaintError::Http { status, body });
        }

        resp.json().await.map_err(|e| InpaintError::Network {
            context: "Failed to parse job list".into(),
            source: e,
        })
    }

    /// Poll until the job finishes, using the configured interval.
    ///
    /// Never times out; drop the future to stop polling.
    pub async fn wait_for_completion(self: &Arc<Self>, job_id: &str) -> JobOutcome {
        JobPoller::new(Arc::clone(self), self.config.poll_interval)
            .spawn(job_id)
            .wait()
            .await
    }

    // ── Results ─────────────────────────────────────────────────────

    /// Raw bytes of a result image. Inline data URIs are decoded locally;
    /// URLs are downloaded (relative paths resolve against the endpoint).
    pub async fn fetch_result_bytes(&self, result: &ResultImage) -> Result<Vec<u8>> {
        let url = match result.source() {
            ImageSource::DataUri { .. } => return result.decode_data_uri(),
            ImageSource::Url(url) if url.starts_with('/') => self.url(url),
            ImageSource::Url(url) => url.to_string(),
        };

        let resp = self
            .http
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| InpaintError::Network {
                context: format!("Failed to fetch result image {}", url),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(InpaintError::Http {
                status: resp.status().as_u16(),
                body: format!("Failed to fetch result image {}", url),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| InpaintError::Network {
            context: "Failed to read result image bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

/// Where a 307/308 response points, resolved against the request URL.
fn redirect_target(resp: &reqwest::Response) -> Option<reqwest::Url> {
    if !matches!(
        resp.status(),
        reqwest::StatusCode::TEMPORARY_REDIRECT | reqwest::StatusCode::PERMANENT_REDIRECT
    ) {
        return None;
    }
    let location = resp.headers().get(reqwest::header::LOCATION)?.to_str().ok()?;
    resp.url().join(location).ok()
}

fn image_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

fn file_part(bytes: &[u8], file_name: &'static str) -> Result<Part> {
    Part::bytes(bytes.to_vec())
        .file_name(file_name)
        .mime_str(image_mime(bytes))
        .map_err(|e| InpaintError::Submission {
            status: None,
            message: format!("Invalid content type for {}: {}", file_name, e),
        })
}

fn build_form(image: &[u8], mask: &[u8], params: &GenerationParameters) -> Result<Form> {
    let mut form = Form::new()
        .part("image", file_part(image, IMAGE_FILE_NAME)?)
        .part("mask", file_part(mask, MASK_FILE_NAME)?);
    for (name, value) in params.form_fields() {
        form = form.text(name, value);
    }
    Ok(form)
}
