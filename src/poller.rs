use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, WeightsError};
use crate::transport::{ApiRequest, Transport};
use crate::types::{JobId, JobStatus, ProgressUpdate, StatusSnapshot};

/// Progress callback that does nothing.
pub fn ignore_progress(_update: ProgressUpdate) {}

/// Remembers the last `lastModifiedDate` seen for one job.
///
/// Markers are only compared for equality; a missing marker is a value of
/// its own.
#[derive(Debug, Default)]
pub(crate) struct MarkerTracker {
    last_seen: Option<Option<Value>>,
}

impl MarkerTracker {
    /// Record `marker` and report whether it differs from the previous one.
    /// The first observation always counts as a change.
    pub(crate) fn observe(&mut self, marker: &Option<Value>) -> bool {
        if self.last_seen.as_ref() == Some(marker) {
            return false;
        }
        self.last_seen = Some(marker.clone());
        true
    }
}

/// Path of the status endpoint for `job_id`, with the id percent-encoded
/// as a single segment.
pub(crate) fn status_path(job_id: &JobId) -> String {
    format!("/status/{}", urlencoding::encode(job_id.as_str()))
}

/// Query `/status/{job_id}` once, without a health check.
pub(crate) async fn fetch_status<T: Transport>(
    transport: &T,
    job_id: &JobId,
) -> Result<StatusSnapshot> {
    let json = transport.send(ApiRequest::get(status_path(job_id))).await?;
    serde_json::from_value(json).map_err(|e| {
        WeightsError::InvalidResponse(format!("Malformed status response for {}: {}", job_id, e))
    })
}

/// Drives one job from its first status query to a terminal state.
pub(crate) struct StatusPoller<'a, T> {
    transport: &'a T,
    interval: Duration,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, T: Transport> StatusPoller<'a, T> {
    pub(crate) fn new(
        transport: &'a T,
        interval: Duration,
        cancel: Option<&'a CancellationToken>,
    ) -> Self {
        Self {
            transport,
            interval,
            cancel,
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(WeightsError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Wait one poll interval, returning early if the token fires.
    async fn pause(&self) -> Result<()> {
        match self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(WeightsError::Cancelled),
                _ = tokio::time::sleep(self.interval) => Ok(()),
            },
            None => {
                tokio::time::sleep(self.interval).await;
                Ok(())
            }
        }
    }

    /// Poll until COMPLETED (returns the snapshot) or FAILED (returns
    /// [`WeightsError::GenerationFailed`]). `on_progress` runs once per
    /// distinct marker, starting with the first response.
    pub(crate) async fn run<F>(&self, job_id: &JobId, mut on_progress: F) -> Result<StatusSnapshot>
    where
        F: FnMut(ProgressUpdate),
    {
        let mut tracker = MarkerTracker::default();
        let mut polls: u64 = 0;

        loop {
            if polls > 0 {
                self.pause().await?;
            }
            self.check_cancelled()?;

            let snapshot = fetch_status(self.transport, job_id).await?;
            polls += 1;

            if tracker.observe(&snapshot.last_modified) {
                tracing::debug!(job_id = %job_id, status = %snapshot.status, polls, "Job progressed");
                on_progress(ProgressUpdate::new(job_id, &snapshot));
            }

            match snapshot.status {
                JobStatus::Completed => {
                    tracing::info!(job_id = %job_id, polls, "Image generation completed");
                    return Ok(snapshot);
                }
                JobStatus::Failed => {
                    let message = snapshot
                        .error
                        .unwrap_or_else(|| "no error detail provided".to_string());
                    tracing::warn!(job_id = %job_id, error = %message, "Image generation failed");
                    return Err(WeightsError::GenerationFailed {
                        job_id: job_id.to_string(),
                        message,
                    });
                }
                _ => {}
            }
        }
    }
}
