use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SubscriptionId = u64;
pub type StartAttempt = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTaskRequest {
    pub prompt: String,
    pub browser_only: bool,
    pub search_engine: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub safe_mode: bool,
}

/// Server view of a task, from `GET /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: Option<f64>,
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Confirm,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TaskCreated {
        attempt: StartAttempt,
        result: Result<String, ApiError>,
    },
    StreamFrame {
        subscription: SubscriptionId,
        frame: SseFrame,
    },
    StreamFailed {
        subscription: SubscriptionId,
        error: ApiError,
    },
    StreamEnded {
        subscription: SubscriptionId,
    },
    ActionCompleted {
        action: ActionKind,
        task_id: String,
        result: Result<(), ApiError>,
    },
    ModelsFetched {
        provider: String,
        result: Result<Vec<String>, ApiError>,
    },
    TaskFetched {
        task_id: String,
        result: Result<TaskSnapshot, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Server-provided detail, or the transport's status text.
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidUrl,
    Network,
    Rejected { status: u16 },
    Decode,
}
