//! Pilot engine: backend client, event-stream decoding and effect execution.
mod api;
mod engine;
mod persist;
mod sse;
mod types;

pub use api::{ApiSettings, FrameStream, ReqwestTaskApi, TaskApi};
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use persist::{ensure_config_dir, AtomicFileWriter, PersistError};
pub use sse::SseDecoder;
pub use types::{
    ActionKind, ApiError, ApiErrorKind, CreateTaskRequest, EngineEvent, SseFrame, StartAttempt,
    SubscriptionId, TaskSnapshot,
};
