//! # weights-client
//!
//! Async Rust client for the unofficial Weights image-generation API.
//!
//! Provides typed access to the service's REST endpoints (health, quota,
//! LoRA and voice-model search, image generation, voice generation, job
//! status) and a polling workflow that drives a submitted job to
//! completion while reporting progress.
//!
//! Every operation is gated by a `/health` check: when the service is not
//! reachable the call fails fast with [`WeightsError::ServiceUnavailable`]
//! instead of attempting the real request.
//!
//! ## Quick Start
//!
//! ```no_run
//! use weights_client::{ClientConfig, GenerationRequest, WeightsClient};
//!
//! # async fn example() -> weights_client::Result<()> {
//! let client = WeightsClient::new(ClientConfig::from_env("my-api-key"))?;
//!
//! let request = GenerationRequest::new("a lighthouse on a cliff at dusk, oil painting")
//!     .lora("impressionism");
//!
//! let snapshot = client
//!     .generate_and_wait(&request, |update| {
//!         println!("{} is {}", update.job_id, update.status);
//!     })
//!     .await?;
//!
//! println!("Finished: {:?}", snapshot.extra);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom transports
//!
//! [`WeightsClient`] is generic over [`Transport`]. The default
//! [`HttpTransport`] uses a pooled `reqwest::Client`; tests and embedders can
//! supply their own implementation with [`WeightsClient::from_transport`].

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod transport;
pub mod types;

pub use client::WeightsClient;
pub use config::ClientConfig;
pub use error::{Result, WeightsError};
pub use poller::ignore_progress;
pub use transport::{ApiRequest, HttpTransport, Transport};
pub use types::{
    GenerationRequest, HealthStatus, JobId, JobStatus, ProgressUpdate, QuotaInfo, SearchResult,
    StatusSnapshot, Submission, VoiceInput, VoiceRequest, VoiceResult,
};
pub use tokio_util::sync::CancellationToken;
