//! Typed stream events.
//!
//! The backend pushes named server-sent events whose data is a JSON envelope
//! `{"type": ..., "data": {...}, "timestamp": ...}`. Only `data` is read. Every
//! payload field is optional and leniently typed: a field with an unexpected
//! JSON type reads as absent, and an envelope that is not JSON at all yields
//! the default payload for its kind.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LogPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub step: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub tool: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub reason: Option<String>,
    #[serde(deserialize_with = "lenient_millis")]
    pub duration_ms: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    pub error: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmationPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub tool: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct UserInputPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ResultPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct StatusPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ErrorPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Log(LogPayload),
    NeedsConfirmation(ConfirmationPayload),
    NeedsUserInput(UserInputPayload),
    Result(ResultPayload),
    Status(StatusPayload),
    Error(ErrorPayload),
    Unknown { kind: String },
}

impl TaskEvent {
    /// Builds an event from an SSE event name and its raw data field.
    pub fn parse(kind: &str, data: &str) -> Self {
        let payload = envelope_payload(data);
        match kind {
            "log" => TaskEvent::Log(decode(payload)),
            "needs_confirmation" => TaskEvent::NeedsConfirmation(decode(payload)),
            "needs_user_input" => TaskEvent::NeedsUserInput(decode(payload)),
            "result" => TaskEvent::Result(decode(payload)),
            "status" => TaskEvent::Status(decode(payload)),
            "error" => TaskEvent::Error(decode(payload)),
            other => TaskEvent::Unknown {
                kind: other.to_string(),
            },
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            TaskEvent::Log(_) => "log",
            TaskEvent::NeedsConfirmation(_) => "needs_confirmation",
            TaskEvent::NeedsUserInput(_) => "needs_user_input",
            TaskEvent::Result(_) => "result",
            TaskEvent::Status(_) => "status",
            TaskEvent::Error(_) => "error",
            TaskEvent::Unknown { kind } => kind,
        }
    }
}

/// Status values the backend reports in `status` events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Queued,
    Running,
    WaitingConfirm,
    WaitingUser,
    Done,
    Stopped,
    Error,
    Other(String),
}

impl RemoteStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => RemoteStatus::Queued,
            "running" => RemoteStatus::Running,
            "waiting_confirm" => RemoteStatus::WaitingConfirm,
            "waiting_user" => RemoteStatus::WaitingUser,
            "done" => RemoteStatus::Done,
            "stopped" => RemoteStatus::Stopped,
            "error" => RemoteStatus::Error,
            other => RemoteStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemoteStatus::Done | RemoteStatus::Stopped | RemoteStatus::Error
        )
    }
}

fn envelope_payload(data: &str) -> Value {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(mut envelope)) => envelope.remove("data").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn decode<T: DeserializeOwned + Default>(payload: Value) -> T {
    if !payload.is_object() {
        return T::default();
    }
    serde_json::from_value(payload).unwrap_or_default()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .map(|ms| ms.round() as u64)
        }),
        Value::String(text) => text.trim().parse::<f64>().ok().and_then(|ms| {
            if ms.is_finite() && ms >= 0.0 {
                Some(ms.round() as u64)
            } else {
                None
            }
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_envelope_is_unwrapped() {
        let data = r#"{"type":"log","data":{"step":1,"tool":"navigate","status":"ok","duration_ms":1200},"timestamp":1.5}"#;
        let event = TaskEvent::parse("log", data);
        assert_eq!(
            event,
            TaskEvent::Log(LogPayload {
                step: Some("1".to_string()),
                tool: Some("navigate".to_string()),
                status: Some("ok".to_string()),
                duration_ms: Some(1200),
                ..LogPayload::default()
            })
        );
    }

    #[test]
    fn malformed_data_reads_as_empty_payload() {
        assert_eq!(
            TaskEvent::parse("status", "not json"),
            TaskEvent::Status(StatusPayload::default())
        );
        assert_eq!(
            TaskEvent::parse("result", r#"{"data":"oops"}"#),
            TaskEvent::Result(ResultPayload::default())
        );
        assert_eq!(
            TaskEvent::parse("needs_user_input", r#"{"type":"needs_user_input"}"#),
            TaskEvent::NeedsUserInput(UserInputPayload::default())
        );
    }

    #[test]
    fn wrongly_typed_fields_are_dropped_not_fatal() {
        let data = r#"{"data":{"tool":{"nested":true},"duration_ms":"850.4","error":null,"status":"ok"}}"#;
        let TaskEvent::Log(payload) = TaskEvent::parse("log", data) else {
            panic!("expected log event");
        };
        assert_eq!(payload.tool, None);
        assert_eq!(payload.duration_ms, Some(850));
        assert_eq!(payload.error, None);
        assert_eq!(payload.status.as_deref(), Some("ok"));
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let event = TaskEvent::parse("heartbeat", "{}");
        assert_eq!(
            event,
            TaskEvent::Unknown {
                kind: "heartbeat".to_string()
            }
        );
        assert_eq!(event.kind(), "heartbeat");
    }

    #[test]
    fn remote_status_terminal_set() {
        for raw in ["done", "stopped", "error"] {
            assert!(RemoteStatus::parse(raw).is_terminal(), "{raw}");
        }
        for raw in ["queued", "running", "waiting_confirm", "waiting_user", "paused"] {
            assert!(!RemoteStatus::parse(raw).is_terminal(), "{raw}");
        }
    }
}
