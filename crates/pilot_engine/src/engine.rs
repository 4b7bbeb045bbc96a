use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use futures_util::StreamExt;
use pilot_logging::{pilot_debug, pilot_info, pilot_warn};
use tokio_util::sync::CancellationToken;

use crate::api::TaskApi;
use crate::{ActionKind, CreateTaskRequest, EngineEvent, StartAttempt, SubscriptionId};

/// Receives engine results. Called from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    CreateTask {
        attempt: StartAttempt,
        request: CreateTaskRequest,
    },
    OpenStream {
        subscription: SubscriptionId,
        task_id: String,
    },
    CloseStream {
        subscription: SubscriptionId,
    },
    Confirm {
        task_id: String,
        response: Option<String>,
    },
    Stop {
        task_id: String,
    },
    FetchModels {
        provider: String,
        api_key: String,
        base_url: Option<String>,
    },
    FetchTask {
        task_id: String,
    },
}

/// Runs backend calls on a dedicated tokio runtime.
///
/// Commands are queued from any thread; results come back through the sink.
/// Each open stream owns a cancellation token keyed by its subscription id.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn TaskApi>, sink: Arc<dyn EventSink>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("pilot-engine")
            .build()?;

        thread::Builder::new()
            .name("pilot-engine-commands".to_string())
            .spawn(move || {
                let mut streams: HashMap<SubscriptionId, CancellationToken> = HashMap::new();
                while let Ok(command) = cmd_rx.recv() {
                    streams.retain(|_, token| !token.is_cancelled());
                    match command {
                        EngineCommand::OpenStream {
                            subscription,
                            task_id,
                        } => {
                            let token = CancellationToken::new();
                            if let Some(previous) = streams.insert(subscription, token.clone()) {
                                previous.cancel();
                            }
                            runtime.spawn(run_stream(
                                api.clone(),
                                sink.clone(),
                                subscription,
                                task_id,
                                token,
                            ));
                        }
                        EngineCommand::CloseStream { subscription } => {
                            match streams.remove(&subscription) {
                                Some(token) => {
                                    pilot_debug!("closing stream {}", subscription);
                                    token.cancel();
                                }
                                None => pilot_debug!("stream {} already closed", subscription),
                            }
                        }
                        command => {
                            let api = api.clone();
                            let sink = sink.clone();
                            runtime.spawn(async move {
                                handle_request(api.as_ref(), sink.as_ref(), command).await;
                            });
                        }
                    }
                }
                for token in streams.values() {
                    token.cancel();
                }
                runtime.shutdown_background();
            })?;

        Ok(Self { cmd_tx })
    }

    pub fn create_task(&self, attempt: StartAttempt, request: CreateTaskRequest) {
        self.send(EngineCommand::CreateTask { attempt, request });
    }

    pub fn open_stream(&self, subscription: SubscriptionId, task_id: impl Into<String>) {
        self.send(EngineCommand::OpenStream {
            subscription,
            task_id: task_id.into(),
        });
    }

    /// Closing an unknown or already-finished subscription is a no-op.
    pub fn close_stream(&self, subscription: SubscriptionId) {
        self.send(EngineCommand::CloseStream { subscription });
    }

    pub fn confirm(&self, task_id: impl Into<String>, response: Option<String>) {
        self.send(EngineCommand::Confirm {
            task_id: task_id.into(),
            response,
        });
    }

    pub fn stop(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::Stop {
            task_id: task_id.into(),
        });
    }

    pub fn fetch_models(
        &self,
        provider: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) {
        self.send(EngineCommand::FetchModels {
            provider: provider.into(),
            api_key: api_key.into(),
            base_url,
        });
    }

    pub fn fetch_task(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::FetchTask {
            task_id: task_id.into(),
        });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            pilot_warn!("engine command dropped: worker has exited");
        }
    }
}

async fn handle_request(api: &dyn TaskApi, sink: &dyn EventSink, command: EngineCommand) {
    match command {
        EngineCommand::CreateTask { attempt, request } => {
            let result = api.create_task(&request).await;
            if let Err(err) = &result {
                pilot_warn!("create task (attempt {}) failed: {}", attempt, err);
            }
            sink.emit(EngineEvent::TaskCreated { attempt, result });
        }
        EngineCommand::Confirm { task_id, response } => {
            let result = api.confirm(&task_id, response.as_deref()).await;
            sink.emit(EngineEvent::ActionCompleted {
                action: ActionKind::Confirm,
                task_id,
                result,
            });
        }
        EngineCommand::Stop { task_id } => {
            let result = api.stop(&task_id).await;
            sink.emit(EngineEvent::ActionCompleted {
                action: ActionKind::Stop,
                task_id,
                result,
            });
        }
        EngineCommand::FetchModels {
            provider,
            api_key,
            base_url,
        } => {
            let result = api
                .fetch_models(&provider, &api_key, base_url.as_deref())
                .await;
            sink.emit(EngineEvent::ModelsFetched { provider, result });
        }
        EngineCommand::FetchTask { task_id } => {
            let result = api.get_task(&task_id).await;
            sink.emit(EngineEvent::TaskFetched { task_id, result });
        }
        EngineCommand::OpenStream { .. } | EngineCommand::CloseStream { .. } => {}
    }
}

async fn run_stream(
    api: Arc<dyn TaskApi>,
    sink: Arc<dyn EventSink>,
    subscription: SubscriptionId,
    task_id: String,
    token: CancellationToken,
) {
    let opened = tokio::select! {
        _ = token.cancelled() => return,
        opened = api.open_stream(&task_id) => opened,
    };
    let mut frames = match opened {
        Ok(frames) => frames,
        Err(error) => {
            token.cancel();
            sink.emit(EngineEvent::StreamFailed {
                subscription,
                error,
            });
            return;
        }
    };
    pilot_info!("stream {} attached to task {}", subscription, task_id);

    loop {
        let next = tokio::select! {
            _ = token.cancelled() => {
                pilot_debug!("stream {} cancelled", subscription);
                return;
            }
            next = frames.next() => next,
        };
        match next {
            Some(Ok(frame)) => sink.emit(EngineEvent::StreamFrame {
                subscription,
                frame,
            }),
            Some(Err(error)) => {
                token.cancel();
                sink.emit(EngineEvent::StreamFailed {
                    subscription,
                    error,
                });
                return;
            }
            None => {
                token.cancel();
                sink.emit(EngineEvent::StreamEnded { subscription });
                return;
            }
        }
    }
}
