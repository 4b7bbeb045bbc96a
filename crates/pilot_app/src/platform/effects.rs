use std::io;
use std::sync::{mpsc, Arc};

use pilot_core::{Effect, KeyValueStore, Msg, PendingAction, TaskEvent, TaskRequest};
use pilot_engine::{
    ActionKind, CreateTaskRequest, EngineEvent, EngineHandle, EventSink, TaskApi,
};
use pilot_logging::{pilot_debug, pilot_info, pilot_warn};

/// Everything the event loop waits on.
#[derive(Debug)]
pub enum LoopInput {
    Msg(Msg),
    /// One line typed on stdin.
    Line(String),
    /// Stdin reached end of file.
    InputClosed,
}

/// Turns engine results into messages on the loop's queue.
struct MsgSink {
    tx: mpsc::Sender<LoopInput>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        match to_msg(event) {
            Some(msg) => {
                let _ = self.tx.send(LoopInput::Msg(msg));
            }
            None => pilot_debug!("engine event without a message mapping dropped"),
        }
    }
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(api: Arc<dyn TaskApi>, tx: mpsc::Sender<LoopInput>) -> io::Result<Self> {
        let engine = EngineHandle::new(api, Arc::new(MsgSink { tx }))?;
        Ok(Self { engine })
    }

    pub fn run(&self, effects: Vec<Effect>, store: &mut dyn KeyValueStore) {
        for effect in effects {
            match effect {
                Effect::CreateTask { attempt, request } => {
                    pilot_info!(
                        "CreateTask attempt={} prompt_len={} provider={:?} model={:?}",
                        attempt,
                        request.prompt.len(),
                        request.provider,
                        request.model
                    );
                    self.engine.create_task(attempt, to_create_request(request));
                }
                Effect::OpenStream {
                    subscription,
                    task_id,
                } => {
                    pilot_info!("OpenStream subscription={} task={}", subscription, task_id);
                    self.engine.open_stream(subscription, task_id);
                }
                Effect::CloseStream { subscription } => {
                    pilot_info!("CloseStream subscription={}", subscription);
                    self.engine.close_stream(subscription);
                }
                Effect::SubmitConfirm { task_id, response } => {
                    pilot_info!(
                        "SubmitConfirm task={} with_reply={}",
                        task_id,
                        response.is_some()
                    );
                    self.engine.confirm(task_id, response);
                }
                Effect::SubmitStop { task_id } => {
                    pilot_info!("SubmitStop task={}", task_id);
                    self.engine.stop(task_id);
                }
                Effect::FetchModels {
                    provider,
                    api_key,
                    base_url,
                } => {
                    pilot_info!("FetchModels provider={}", provider);
                    self.engine
                        .fetch_models(provider, api_key.expose(), base_url);
                }
                Effect::PersistSetting { key, value } => {
                    pilot_debug!("PersistSetting {}={}", key, value);
                    store.set(&key, &value);
                }
            }
        }
    }
}

fn to_create_request(request: TaskRequest) -> CreateTaskRequest {
    CreateTaskRequest {
        prompt: request.prompt,
        browser_only: request.browser_only,
        search_engine: request.search_engine,
        model: request.model,
        provider: request.provider,
        safe_mode: request.safe_mode,
    }
}

pub(crate) fn to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::TaskCreated { attempt, result } => match result {
            Ok(task_id) => Msg::TaskCreated { attempt, task_id },
            Err(err) => Msg::TaskRejected {
                attempt,
                detail: err.message,
            },
        },
        EngineEvent::StreamFrame {
            subscription,
            frame,
        } => Msg::StreamEvent {
            subscription,
            event: TaskEvent::parse(&frame.event, &frame.data),
        },
        EngineEvent::StreamFailed {
            subscription,
            error,
        } => {
            pilot_warn!("Stream {} failed: {}", subscription, error);
            Msg::StreamFailed {
                subscription,
                message: error.message,
            }
        }
        EngineEvent::StreamEnded { subscription } => Msg::StreamEnded { subscription },
        EngineEvent::ActionCompleted {
            action,
            task_id,
            result,
        } => Msg::ActionCompleted {
            action: map_action(action),
            task_id,
            result: result.map_err(|err| err.message),
        },
        EngineEvent::ModelsFetched { provider, result } => Msg::ModelsFetched {
            provider,
            result: result.map_err(|err| err.message),
        },
        EngineEvent::TaskFetched { .. } => return None,
    };
    Some(msg)
}

fn map_action(action: ActionKind) -> PendingAction {
    match action {
        ActionKind::Confirm => PendingAction::Confirm,
        ActionKind::Stop => PendingAction::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_engine::{ApiError, ApiErrorKind, SseFrame};
    use pretty_assertions::assert_eq;

    #[test]
    fn stream_frames_become_typed_events() {
        let msg = to_msg(EngineEvent::StreamFrame {
            subscription: 3,
            frame: SseFrame {
                event: "needs_user_input".into(),
                data: r#"{"type":"needs_user_input","data":{"question":"Which date?"}}"#.into(),
            },
        });
        assert_eq!(
            msg,
            Some(Msg::StreamEvent {
                subscription: 3,
                event: TaskEvent::parse(
                    "needs_user_input",
                    r#"{"data":{"question":"Which date?"}}"#
                ),
            })
        );
    }

    #[test]
    fn rejected_start_carries_server_detail() {
        let msg = to_msg(EngineEvent::TaskCreated {
            attempt: 2,
            result: Err(ApiError::new(
                ApiErrorKind::Rejected { status: 400 },
                "Model is required",
            )),
        });
        assert_eq!(
            msg,
            Some(Msg::TaskRejected {
                attempt: 2,
                detail: "Model is required".into(),
            })
        );
    }

    #[test]
    fn action_failures_keep_their_kind() {
        let msg = to_msg(EngineEvent::ActionCompleted {
            action: ActionKind::Stop,
            task_id: "t".into(),
            result: Err(ApiError::new(ApiErrorKind::Network, "connection refused")),
        });
        assert_eq!(
            msg,
            Some(Msg::ActionCompleted {
                action: PendingAction::Stop,
                task_id: "t".into(),
                result: Err("connection refused".into()),
            })
        );
    }
}
