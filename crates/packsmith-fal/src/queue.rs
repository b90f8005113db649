//! Queue status parsing and the progress curve reported while polling.

use serde::Deserialize;
use serde_json::Value;

/// Progress while waiting in the queue.
pub const QUEUED_PROGRESS: u8 = 50;
/// First and last progress values while the job runs.
pub const RUNNING_PROGRESS_START: u8 = 60;
pub const RUNNING_PROGRESS_END: u8 = 90;
/// Increase per in-progress poll.
const RUNNING_PROGRESS_STEP: u8 = 3;

/// Reply to `POST {queue_base}/{app}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub request_id: String,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Job state reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    InQueue { position: Option<u64> },
    InProgress,
    Completed,
    /// Anything else, e.g. an error state.
    Other(String),
}

#[derive(Debug, Clone, Deserialize)]
struct RawStatus {
    status: String,
    #[serde(default)]
    queue_position: Option<u64>,
    #[serde(default)]
    logs: Option<Vec<Value>>,
}

/// One parsed status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub state: QueueState,
    pub logs: Vec<String>,
}

impl StatusUpdate {
    pub fn parse(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawStatus = serde_json::from_value(value)?;
        let state = match raw.status.as_str() {
            "IN_QUEUE" => QueueState::InQueue {
                position: raw.queue_position,
            },
            "IN_PROGRESS" => QueueState::InProgress,
            "COMPLETED" => QueueState::Completed,
            _ => QueueState::Other(raw.status),
        };
        let logs = raw
            .logs
            .unwrap_or_default()
            .iter()
            .filter_map(log_message)
            .collect();
        Ok(Self { state, logs })
    }

    pub fn stage(&self) -> &str {
        match &self.state {
            QueueState::InQueue { .. } => "IN_QUEUE",
            QueueState::InProgress => "IN_PROGRESS",
            QueueState::Completed => "COMPLETED",
            QueueState::Other(s) => s.as_str(),
        }
    }
}

/// Log entries are objects with `message` or plain strings.
fn log_message(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("message")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Progress for the `n`-th in-progress poll (0-based), climbing to the cap.
pub fn running_progress(polls: u32) -> u8 {
    let step = u32::from(RUNNING_PROGRESS_STEP).saturating_mul(polls);
    let value = u32::from(RUNNING_PROGRESS_START).saturating_add(step);
    u8::try_from(value.min(u32::from(RUNNING_PROGRESS_END))).unwrap_or(RUNNING_PROGRESS_END)
}

/// Model URL from a Trellis result: `model_mesh.url` or a bare string.
pub fn model_url(result: &Value) -> Option<String> {
    match result.get("model_mesh")? {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Object(mesh) => mesh.get("url")?.as_str().map(str::to_string),
        _ => None,
    }
}
