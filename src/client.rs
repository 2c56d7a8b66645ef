use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};
use crate::error::{Result, WeightsError};
use crate::poller::{fetch_status, StatusPoller};
use crate::transport::{ApiRequest, HttpTransport, Transport};
use crate::types::*;

/// Async client for the Weights image-generation API.
///
/// Every public operation first checks `/health`; if that fails the call
/// returns [`WeightsError::ServiceUnavailable`] without touching any other
/// endpoint. Clones share one transport, so a single client can drive many
/// jobs concurrently.
///
/// # Example
/// ```no_run
/// use weights_client::{ClientConfig, WeightsClient};
///
/// # async fn example() -> weights_client::Result<()> {
/// let client = WeightsClient::new(ClientConfig::from_env("my-key"))?;
/// let health = client.health().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WeightsClient<T = HttpTransport> {
    transport: Arc<T>,
    poll_interval: Duration,
    health_timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl<T> Clone for WeightsClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            poll_interval: self.poll_interval,
            health_timeout: self.health_timeout,
            cancel: self.cancel.clone(),
        }
    }
}

impl WeightsClient<HttpTransport> {
    /// Open an HTTP transport for `config` and wrap it in a client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::open(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            poll_interval: config.poll_interval,
            health_timeout: Some(config.health_timeout),
            cancel: None,
        })
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }
}

impl<T: Transport> WeightsClient<T> {
    /// Use a custom transport. Polls every 100ms unless changed with
    /// [`with_poll_interval`](Self::with_poll_interval).
    pub fn from_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            poll_interval: DEFAULT_POLL_INTERVAL,
            health_timeout: None,
            cancel: None,
        }
    }

    /// Set the delay between status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attach a cancellation token. Once it fires, polling stops with
    /// [`WeightsError::Cancelled`], interrupting the wait between polls.
    ///
    /// Give each concurrent job its own clone and token (or a child token).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the delay between status polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    // ── Health ──────────────────────────────────────────────────────

    /// Check `/health`. Any failure, network-level or HTTP, is reported as
    /// [`WeightsError::ServiceUnavailable`] with the original error kept as
    /// its source.
    pub async fn ensure_reachable(&self) -> Result<HealthStatus> {
        let mut request = ApiRequest::get("/health");
        if let Some(timeout) = self.health_timeout {
            request = request.timeout(timeout);
        }
        match self.transport.send(request).await {
            Ok(details) => Ok(HealthStatus::from_payload(details)),
            Err(e) => {
                tracing::warn!(error = %e, "Weights API health check failed");
                Err(WeightsError::ServiceUnavailable {
                    source: Box::new(e),
                })
            }
        }
    }

    /// Alias for [`ensure_reachable`](Self::ensure_reachable).
    pub async fn health(&self) -> Result<HealthStatus> {
        self.ensure_reachable().await
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Fetch the account quota. The payload is returned as sent.
    pub async fn quota(&self) -> Result<QuotaInfo> {
        self.ensure_reachable().await?;
        let json = self.transport.send(ApiRequest::get("/quota")).await?;
        Ok(QuotaInfo(json))
    }

    /// Search LoRA models by name. The payload is returned as sent.
    pub async fn search_loras(&self, query: &str) -> Result<SearchResult> {
        self.ensure_reachable().await?;
        let json = self
            .transport
            .send(ApiRequest::get("/search-loras").payload(json!({ "query": query })))
            .await?;
        Ok(SearchResult(json))
    }

    /// Fetch the current status of a job once.
    pub async fn job_status(&self, job_id: &JobId) -> Result<StatusSnapshot> {
        self.ensure_reachable().await?;
        fetch_status(self.transport.as_ref(), job_id).await
    }

    // ── Voice ───────────────────────────────────────────────────────

    /// Search voice models by name. The payload is returned as sent.
    pub async fn search_voice_models(&self, query: &str) -> Result<SearchResult> {
        self.ensure_reachable().await?;
        let json = self
            .transport
            .send(ApiRequest::get("/search-voices-models").payload(json!({ "query": query })))
            .await?;
        Ok(SearchResult(json))
    }

    /// Run a voice model over text or an audio recording.
    pub async fn generate_voice(&self, request: &VoiceRequest) -> Result<VoiceResult> {
        self.ensure_reachable().await?;
        let json = self
            .transport
            .send(ApiRequest::post("/voice").payload(request.to_payload()))
            .await?;
        let result: VoiceResult = serde_json::from_value(json).map_err(|e| {
            WeightsError::InvalidResponse(format!("Malformed /voice response: {}", e))
        })?;

        tracing::info!(model = %request.voice_model_name, pitch = request.pitch, "Generated voice audio");
        Ok(result)
    }

    /// Text-to-speech with `voice_model_name`.
    pub async fn voice_from_text(
        &self,
        voice_model_name: &str,
        text: &str,
        pitch: i32,
    ) -> Result<VoiceResult> {
        self.generate_voice(&VoiceRequest::from_text(voice_model_name, text).pitch(pitch))
            .await
    }

    /// Convert the recording at `audio_url` with `voice_model_name`.
    pub async fn voice_from_audio_url(
        &self,
        voice_model_name: &str,
        audio_url: &str,
        pitch: i32,
    ) -> Result<VoiceResult> {
        self.generate_voice(&VoiceRequest::from_audio_url(voice_model_name, audio_url).pitch(pitch))
            .await
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Submit a generation job. Returns the service's answer, including the
    /// new job's id.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<Submission> {
        self.ensure_reachable().await?;
        self.submit_unchecked(request).await
    }

    async fn submit_unchecked(&self, request: &GenerationRequest) -> Result<Submission> {
        let payload = json!({
            "prompt": request.prompt,
            "loraName": request.lora_name,
        });
        let json: Value = self
            .transport
            .send(ApiRequest::get("/generateImage").payload(payload))
            .await?;

        if json.get("imageId").map_or(true, Value::is_null) {
            return Err(WeightsError::InvalidResponse(
                "Response missing imageId".into(),
            ));
        }
        let submission: Submission = serde_json::from_value(json).map_err(|e| {
            WeightsError::InvalidResponse(format!("Malformed /generateImage response: {}", e))
        })?;

        tracing::info!(job_id = %submission.image_id, lora = ?request.lora_name, "Submitted image generation");
        Ok(submission)
    }

    // ── Completion waiting ──────────────────────────────────────────

    /// Poll `/status/{job_id}` until the job completes or fails.
    ///
    /// The health check runs once before the first poll, not per poll.
    /// `on_progress` is called for the first response and then whenever
    /// `lastModifiedDate` changes; pass
    /// [`ignore_progress`](crate::ignore_progress) to skip notifications.
    pub async fn poll_until_done<F>(&self, job_id: &JobId, on_progress: F) -> Result<StatusSnapshot>
    where
        F: FnMut(ProgressUpdate),
    {
        self.ensure_reachable().await?;
        self.poller().run(job_id, on_progress).await
    }

    /// Submit a job and wait for it to finish, with a single health check
    /// for the whole workflow.
    pub async fn generate_and_wait<F>(
        &self,
        request: &GenerationRequest,
        on_progress: F,
    ) -> Result<StatusSnapshot>
    where
        F: FnMut(ProgressUpdate),
    {
        self.ensure_reachable().await?;
        let submission = self.submit_unchecked(request).await?;
        self.poller().run(&submission.image_id, on_progress).await
    }

    fn poller(&self) -> StatusPoller<'_, T> {
        StatusPoller::new(
            self.transport.as_ref(),
            self.poll_interval,
            self.cancel.as_ref(),
        )
    }
}
