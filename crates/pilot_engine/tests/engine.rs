use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

use futures_util::{stream, Stream, StreamExt};
use pilot_engine::{
    ActionKind, ApiError, ApiErrorKind, ChannelEventSink, CreateTaskRequest, EngineEvent,
    EngineHandle, FrameStream, SseFrame, TaskApi, TaskSnapshot,
};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

/// Counts stream drops so tests can observe cancellation.
struct Guarded {
    inner: FrameStream,
    dropped: Arc<AtomicUsize>,
}

impl Stream for Guarded {
    type Item = Result<SseFrame, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for Guarded {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct StubApi {
    frames: Vec<SseFrame>,
    endless: bool,
    opened: AtomicUsize,
    dropped: Arc<AtomicUsize>,
    confirms: Mutex<Vec<(String, Option<String>)>>,
    fail_actions: bool,
}

#[async_trait::async_trait]
impl TaskApi for StubApi {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError> {
        if request.prompt == "reject" {
            return Err(ApiError::new(
                ApiErrorKind::Rejected { status: 422 },
                "prompt rejected",
            ));
        }
        Ok(format!("task-{}", request.prompt))
    }

    async fn confirm(&self, task_id: &str, response: Option<&str>) -> Result<(), ApiError> {
        self.confirms
            .lock()
            .unwrap()
            .push((task_id.to_string(), response.map(str::to_string)));
        if self.fail_actions {
            return Err(ApiError::new(ApiErrorKind::Network, "connection refused"));
        }
        Ok(())
    }

    async fn stop(&self, _task_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn open_stream(&self, _task_id: &str) -> Result<FrameStream, ApiError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let frames = stream::iter(self.frames.clone().into_iter().map(Ok));
        let inner: FrameStream = if self.endless {
            Box::pin(frames.chain(stream::pending()))
        } else {
            Box::pin(frames)
        };
        Ok(Box::pin(Guarded {
            inner,
            dropped: self.dropped.clone(),
        }))
    }

    async fn fetch_models(
        &self,
        provider: &str,
        _api_key: &str,
        _base_url: Option<&str>,
    ) -> Result<Vec<String>, ApiError> {
        Ok(vec![format!("{provider}-model")])
    }

    async fn get_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError> {
        Err(ApiError::new(
            ApiErrorKind::Rejected { status: 404 },
            format!("{task_id} not found"),
        ))
    }
}

fn frame(event: &str, data: &str) -> SseFrame {
    SseFrame {
        event: event.to_string(),
        data: data.to_string(),
    }
}

fn engine(api: Arc<StubApi>) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
    let (tx, rx) = mpsc::channel();
    let handle = EngineHandle::new(api, Arc::new(ChannelEventSink::new(tx))).expect("engine");
    (handle, rx)
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn create_task_reports_attempt_and_outcome() {
    let (engine, events) = engine(Arc::new(StubApi::default()));
    engine.create_task(
        4,
        CreateTaskRequest {
            prompt: "reject".into(),
            browser_only: true,
            search_engine: "google".into(),
            model: None,
            provider: None,
            safe_mode: true,
        },
    );
    match events.recv_timeout(WAIT).expect("event") {
        EngineEvent::TaskCreated { attempt, result } => {
            assert_eq!(attempt, 4);
            let err = result.expect_err("rejected");
            assert_eq!(err.kind, ApiErrorKind::Rejected { status: 422 });
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn stream_frames_arrive_in_order_then_end() {
    let api = Arc::new(StubApi {
        frames: vec![frame("status", "a"), frame("log", "b"), frame("result", "c")],
        ..StubApi::default()
    });
    let (engine, events) = engine(api.clone());
    engine.open_stream(1, "t");

    let mut received = Vec::new();
    loop {
        match events.recv_timeout(WAIT).expect("event") {
            EngineEvent::StreamFrame {
                subscription,
                frame,
            } => {
                assert_eq!(subscription, 1);
                received.push(frame.data);
            }
            EngineEvent::StreamEnded { subscription } => {
                assert_eq!(subscription, 1);
                break;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(received, vec!["a", "b", "c"]);
    assert_eq!(api.opened.load(Ordering::SeqCst), 1);
}

#[test]
fn closing_a_subscription_cancels_its_stream() {
    let api = Arc::new(StubApi {
        frames: vec![frame("status", "running")],
        endless: true,
        ..StubApi::default()
    });
    let (engine, events) = engine(api.clone());
    engine.open_stream(7, "t");
    assert!(matches!(
        events.recv_timeout(WAIT).expect("first frame"),
        EngineEvent::StreamFrame { subscription: 7, .. }
    ));

    engine.close_stream(7);
    assert!(wait_until(|| api.dropped.load(Ordering::SeqCst) == 1));
    // Cancellation is silent: no end or failure is reported.
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());

    // Closing again, or closing an id that never existed, changes nothing.
    engine.close_stream(7);
    engine.close_stream(99);
    engine.fetch_models("openai", "sk", None);
    match events.recv_timeout(WAIT).expect("models") {
        EngineEvent::ModelsFetched { provider, result } => {
            assert_eq!(provider, "openai");
            assert_eq!(result, Ok(vec!["openai-model".to_string()]));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(api.dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn streams_are_independent_per_subscription() {
    let api = Arc::new(StubApi {
        frames: vec![frame("status", "running")],
        endless: true,
        ..StubApi::default()
    });
    let (engine, events) = engine(api.clone());
    engine.open_stream(1, "old");
    engine.open_stream(2, "new");
    for _ in 0..2 {
        events.recv_timeout(WAIT).expect("first frames");
    }

    engine.close_stream(1);
    assert!(wait_until(|| api.dropped.load(Ordering::SeqCst) == 1));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(api.dropped.load(Ordering::SeqCst), 1);
    assert_eq!(api.opened.load(Ordering::SeqCst), 2);
}

#[test]
fn action_failures_are_reported_with_task_id() {
    let api = Arc::new(StubApi {
        fail_actions: true,
        ..StubApi::default()
    });
    let (engine, events) = engine(api.clone());
    engine.confirm("t", Some("yes please".into()));
    match events.recv_timeout(WAIT).expect("completion") {
        EngineEvent::ActionCompleted {
            action,
            task_id,
            result,
        } => {
            assert_eq!(action, ActionKind::Confirm);
            assert_eq!(task_id, "t");
            assert_eq!(result.expect_err("failed").message, "connection refused");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        api.confirms.lock().unwrap().clone(),
        vec![("t".to_string(), Some("yes please".to_string()))]
    );
}

#[test]
fn task_lookup_reports_backend_rejection() {
    let (engine, events) = engine(Arc::new(StubApi::default()));
    engine.fetch_task("gone");
    match events.recv_timeout(WAIT).expect("lookup") {
        EngineEvent::TaskFetched { task_id, result } => {
            assert_eq!(task_id, "gone");
            let err = result.expect_err("missing task");
            assert_eq!(err.kind, ApiErrorKind::Rejected { status: 404 });
            assert_eq!(err.message, "gone not found");
        }
        other => panic!("unexpected event {other:?}"),
    }
}
