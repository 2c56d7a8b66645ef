use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Service-assigned identifier of one generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status string reported by `/status/{imageId}`.
///
/// Only [`JobStatus::Completed`] and [`JobStatus::Failed`] are terminal;
/// every other value, including ones this client does not know, means the
/// job is still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Starting,
    Pending,
    Processing,
    Running,
    NotFound,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Starting => "STARTING",
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Running => "RUNNING",
            JobStatus::NotFound => "NOT_FOUND",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "QUEUED" => JobStatus::Queued,
            "STARTING" => JobStatus::Starting,
            "PENDING" => JobStatus::Pending,
            "PROCESSING" => JobStatus::Processing,
            "RUNNING" => JobStatus::Running,
            "NOT_FOUND" => JobStatus::NotFound,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One response from `/status/{imageId}`.
///
/// `last_modified` is opaque: the service sends a millisecond timestamp,
/// but the client only ever compares it for equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: JobStatus,
    #[serde(default, rename = "lastModifiedDate")]
    pub last_modified: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    /// Any other fields the service attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Parsed `/health` response.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    /// `true` whenever the service answered with a success status.
    pub reachable: bool,
    /// The service's own status string, e.g. `"OK"`.
    pub status: Option<String>,
    /// The raw payload, kept for diagnostics.
    pub details: Value,
}

impl HealthStatus {
    pub(crate) fn from_payload(details: Value) -> Self {
        let status = details
            .get("status")
            .and_then(|v| v.as_str())
            .map(String::from);
        Self {
            reachable: true,
            status,
            details,
        }
    }
}

/// Quota information, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaInfo(pub Value);

/// LoRA search results, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResult(pub Value);

/// Parameters for `/generateImage`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub lora_name: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            lora_name: None,
        }
    }

    /// Generate with the named LoRA model.
    pub fn lora(mut self, name: impl Into<String>) -> Self {
        self.lora_name = Some(name.into());
        self
    }
}

/// Response of `/generateImage`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub image_id: JobId,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status_url: Option<String>,
}

/// What the voice model should speak: text for TTS or a recording to convert.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceInput {
    Text(String),
    AudioUrl(String),
}

/// Parameters for `/voice`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceRequest {
    pub voice_model_name: String,
    pub input: VoiceInput,
    /// Pitch shift in semitones, sent to the service as a string.
    pub pitch: i32,
}

impl VoiceRequest {
    /// Text-to-speech with the named voice model.
    pub fn from_text(voice_model_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            voice_model_name: voice_model_name.into(),
            input: VoiceInput::Text(text.into()),
            pitch: 0,
        }
    }

    /// Convert the recording at `audio_url` with the named voice model.
    pub fn from_audio_url(voice_model_name: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            voice_model_name: voice_model_name.into(),
            input: VoiceInput::AudioUrl(audio_url.into()),
            pitch: 0,
        }
    }

    pub fn pitch(mut self, pitch: i32) -> Self {
        self.pitch = pitch;
        self
    }

    /// JSON body for `POST /voice`.
    pub(crate) fn to_payload(&self) -> Value {
        let mut body = Map::new();
        body.insert("voiceModelName".into(), Value::String(self.voice_model_name.clone()));
        match &self.input {
            VoiceInput::Text(text) => body.insert("text".into(), Value::String(text.clone())),
            VoiceInput::AudioUrl(url) => body.insert("audioUrl".into(), Value::String(url.clone())),
        };
        body.insert("pitch".into(), Value::String(self.pitch.to_string()));
        Value::Object(body)
    }
}

/// Response of `/voice`: where the generated audio can be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResult {
    pub result: String,
}

/// Passed to the progress callback each time a new marker is observed.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
    pub last_modified: Option<Value>,
    pub error: Option<String>,
}

impl ProgressUpdate {
    pub(crate) fn new(job_id: &JobId, snapshot: &StatusSnapshot) -> Self {
        Self {
            job_id: job_id.clone(),
            status: snapshot.status.clone(),
            last_modified: snapshot.last_modified.clone(),
            error: snapshot.error.clone(),
        }
    }
}
