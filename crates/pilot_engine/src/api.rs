use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use pilot_logging::{pilot_debug, pilot_info};
use reqwest::header::ACCEPT;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::sse::SseDecoder;
use crate::{ApiError, ApiErrorKind, CreateTaskRequest, SseFrame, TaskSnapshot};

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<SseFrame, ApiError>> + Send>>;

/// Backend operations the controller depends on.
#[async_trait::async_trait]
pub trait TaskApi: Send + Sync {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError>;

    /// `response` is sent as `{"response": ...}`; `None` sends no body.
    async fn confirm(&self, task_id: &str, response: Option<&str>) -> Result<(), ApiError>;

    async fn stop(&self, task_id: &str) -> Result<(), ApiError>;

    /// Opens the task's push channel. The stream ends when the server closes it.
    async fn open_stream(&self, task_id: &str) -> Result<FrameStream, ApiError>;

    async fn fetch_models(
        &self,
        provider: &str,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<Vec<String>, ApiError>;

    async fn get_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
}

impl ApiSettings {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiErrorKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        Ok(Self { base_url })
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTaskApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ConfirmBody<'a> {
    response: &'a str,
}

#[derive(Serialize)]
struct ModelListBody<'a> {
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreatedBody {
    task_id: String,
}

#[derive(Deserialize, Default)]
struct ModelListReply {
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

impl ReqwestTaskApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(ApiErrorKind::InvalidUrl, "base url cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_expecting_success(&self, url: Url) -> Result<Response, ApiError> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await
    }
}

#[async_trait::async_trait]
impl TaskApi for ReqwestTaskApi {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&["tasks"])?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let created: CreatedBody = response
            .json()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        pilot_info!("task created id={}", created.task_id);
        Ok(created.task_id)
    }

    async fn confirm(&self, task_id: &str, response: Option<&str>) -> Result<(), ApiError> {
        let url = self.endpoint(&["tasks", task_id, "confirm"])?;
        match response {
            Some(text) => {
                let reply = self
                    .client
                    .post(url)
                    .json(&ConfirmBody { response: text })
                    .send()
                    .await
                    .map_err(map_reqwest_error)?;
                ensure_success(reply).await?;
            }
            None => {
                self.post_expecting_success(url).await?;
            }
        }
        Ok(())
    }

    async fn stop(&self, task_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["tasks", task_id, "stop"])?;
        self.post_expecting_success(url).await?;
        Ok(())
    }

    async fn open_stream(&self, task_id: &str) -> Result<FrameStream, ApiError> {
        let url = self.endpoint(&["tasks", task_id, "events"])?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        pilot_debug!("event stream open for task {}", task_id);
        Ok(frame_stream(response.bytes_stream()))
    }

    async fn fetch_models(
        &self,
        provider: &str,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["providers", provider, "models"])?;
        let response = self
            .client
            .post(url)
            .json(&ModelListBody { api_key, base_url })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let reply: ModelListReply = response
            .json()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        Ok(reply.models)
    }

    async fn get_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError> {
        let url = self.endpoint(&["tasks", task_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
    }
}

struct FrameReader<S> {
    body: S,
    decoder: SseDecoder,
    ready: VecDeque<SseFrame>,
    finished: bool,
}

fn frame_stream<S>(body: S) -> FrameStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + Unpin + 'static,
{
    let reader = FrameReader {
        body,
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };
    Box::pin(futures_util::stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(frame) = reader.ready.pop_front() {
                return Some((Ok(frame), reader));
            }
            if reader.finished {
                return None;
            }
            match reader.body.next().await {
                Some(Ok(chunk)) => {
                    let frames = reader.decoder.feed(&chunk);
                    reader.ready.extend(frames);
                }
                Some(Err(err)) => {
                    reader.finished = true;
                    return Some((Err(map_reqwest_error(err)), reader));
                }
                None => {
                    reader.finished = true;
                    reader.ready.extend(reader.decoder.finish());
                }
            }
        }
    }))
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let status_text = status
        .canonical_reason()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| status.to_string());
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.detail)
        .and_then(|detail| match detail {
            Value::String(text) => Some(text),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(status_text);
    Err(ApiError::new(
        ApiErrorKind::Rejected {
            status: status.as_u16(),
        },
        detail,
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::new(ApiErrorKind::Decode, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
