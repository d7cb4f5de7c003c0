use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_OPEN_ERRORS,
    STREAM_OPENS,
};
use crate::sse::process_sse;
use crate::turn::{EventStream, TurnSource, TurnStream, validate_message};
use crate::types::{
    ChatRequest, ChatResponse, ConfigSnapshot, ConfigUpdate, GuidanceRequest, Habit, Health,
    Learning, LearningCreate, SoulMessage, StreamEvent,
};
use crate::{SoulReducer, StreamLogger};

/// Backend used when neither an explicit URL nor `SOULAI_URL` is given.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable naming the backend.
pub const BASE_URL_ENV: &str = "SOULAI_URL";

const API_PREFIX: &str = "api/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the soul backend.
///
/// One-shot calls are bounded by the client's timeout.  Streaming turns are
/// not; a turn lasts as long as the backend keeps the stream open.
#[derive(Clone)]
pub struct SoulClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn StreamLogger>>,
}

impl fmt::Debug for SoulClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoulClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl SoulClient {
    /// Create a new client.
    ///
    /// The backend URL can be provided directly or read from the `SOULAI_URL`
    /// environment variable, falling back to `http://localhost:8000`.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with a custom timeout for one-shot calls.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let client = ReqwestClient::builder()
            .default_headers(default_headers())
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            logger: None,
        })
    }

    /// Record responses and stream events with `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn StreamLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The backend this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Timeout applied to one-shot calls.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(API_PREFIX)?.join(path)?)
    }

    fn map_send_error(&self, e: reqwest::Error, timeout: Option<Duration>) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process backend error responses and convert to our Error type.
    ///
    /// The backend reports errors as `{"detail": ...}` where `detail` is either a
    /// message or a list of validation failures.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail);
        let (error_message, error_param) = match detail {
            Some(serde_json::Value::String(message)) => (message, None),
            Some(serde_json::Value::Array(failures)) => describe_validation_failures(&failures),
            Some(other) => (other.to_string(), None),
            None if error_body.is_empty() => (format!("HTTP {status_code}"), None),
            None => (error_body, None),
        };

        match status_code {
            400 => Error::bad_request(error_message),
            404 => Error::not_found(error_message, None, None),
            408 => Error::timeout(error_message, None),
            422 => Error::validation(error_message, error_param),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_message),
        }
    }

    /// Send a one-shot request and decode its JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.send_inner(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            CLIENT_REQUEST_ERRORS.click();
            tracing::debug!(error = %e, "request failed");
        }
        result
    }

    async fn send_inner<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, Some(self.timeout)))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {e}"),
                Some(Box::new(e)),
            )
        })
    }

    /// Send a message and stream the soul's answer as protocol events.
    ///
    /// Errors returned here happen before any event is produced: an empty
    /// message, a connection failure, or a non-success status.  Failures while
    /// reading the stream are yielded from the stream as [`Error::Streaming`].
    pub async fn stream_chat(
        &self,
        message: &str,
    ) -> Result<impl Stream<Item = Result<StreamEvent>> + Send + 'static> {
        validate_message(message)?;
        let url = self.endpoint("chat/stream")?;

        STREAM_OPENS.click();
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&ChatRequest::new(message))
            .send()
            .await
            .map_err(|e| {
                STREAM_OPEN_ERRORS.click();
                self.map_send_error(e, None)
            })?;

        if !response.status().is_success() {
            STREAM_OPEN_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        Ok(process_sse(Box::pin(response.bytes_stream())))
    }

    /// Send a message and stream snapshots of the soul's answer.
    ///
    /// The turn starts from a fresh [`SoulMessage`] identified by `id`.
    pub async fn turn(
        &self,
        id: impl Into<String>,
        message: &str,
        reducer: SoulReducer,
    ) -> Result<TurnStream> {
        let events = self.stream_chat(message).await?;
        let turn = TurnStream::new(events, reducer, SoulMessage::new(id));
        Ok(match &self.logger {
            Some(logger) => turn.with_logger(Arc::clone(logger)),
            None => turn,
        })
    }

    /// Send a message and wait for the complete answer.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse> {
        validate_message(message)?;
        let url = self.endpoint("chat")?;
        let response: ChatResponse = self
            .send(self.client.post(url).json(&ChatRequest::new(message)))
            .await?;
        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Fetch the backend's health report.
    pub async fn health_status(&self) -> Result<Health> {
        let url = self.endpoint("health")?;
        self.send(self.client.get(url)).await
    }

    /// True if the backend answers its health check with "ok".
    ///
    /// Any failure, including an unreachable backend, counts as unhealthy.
    pub async fn health(&self) -> bool {
        match self.health_status().await {
            Ok(health) => health.is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }

    /// Fetch the soul's configuration.
    pub async fn config(&self) -> Result<ConfigSnapshot> {
        let url = self.endpoint("config")?;
        self.send(self.client.get(url)).await
    }

    /// Apply a partial configuration update and return the new configuration.
    pub async fn update_config(&self, update: &ConfigUpdate) -> Result<ConfigSnapshot> {
        let url = self.endpoint("config")?;
        self.send(self.client.put(url).json(update)).await
    }

    /// List habits, optionally filtered by category and minimum effective weight.
    pub async fn habits(
        &self,
        category: Option<&str>,
        min_weight: Option<f64>,
    ) -> Result<Vec<Habit>> {
        let mut url = self.endpoint("habits")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(category) = category {
                query.append_pair("category", category);
            }
            if let Some(min_weight) = min_weight {
                query.append_pair("min_weight", &min_weight.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.send(self.client.get(url)).await
    }

    /// Reinforce a habit, increasing its effective weight.
    pub async fn reinforce_habit(&self, habit_id: i64) -> Result<Habit> {
        let url = self.endpoint(&format!("habits/{habit_id}/reinforce"))?;
        self.send(self.client.put(url))
            .await
            .map_err(|e| e.for_resource("habit", habit_id))
    }

    /// List learnings awaiting trainer guidance.
    pub async fn pending_learnings(&self) -> Result<Vec<Learning>> {
        let url = self.endpoint("trainer/pending")?;
        self.send(self.client.get(url)).await
    }

    /// List active learnings.
    pub async fn learnings(&self) -> Result<Vec<Learning>> {
        let url = self.endpoint("trainer/learnings")?;
        self.send(self.client.get(url)).await
    }

    /// Answer a pending learning with trainer guidance.
    pub async fn respond_to_learning(
        &self,
        learning_id: i64,
        guidance: &GuidanceRequest,
    ) -> Result<Learning> {
        let url = self.endpoint(&format!("trainer/respond/{learning_id}"))?;
        self.send(self.client.post(url).json(guidance))
            .await
            .map_err(|e| e.for_resource("learning", learning_id))
    }

    /// Teach the soul something without waiting for it to ask.
    pub async fn create_learning(&self, learning: &LearningCreate) -> Result<Learning> {
        let url = self.endpoint("trainer/learnings")?;
        self.send(self.client.post(url).json(learning)).await
    }

    /// Retire a learning.
    pub async fn supersede_learning(&self, learning_id: i64) -> Result<Learning> {
        let url = self.endpoint(&format!("trainer/learnings/{learning_id}"))?;
        self.send(self.client.delete(url))
            .await
            .map_err(|e| e.for_resource("learning", learning_id))
    }
}

#[async_trait]
impl TurnSource for SoulClient {
    async fn open_turn(&self, message: &str) -> Result<EventStream> {
        Ok(Box::pin(self.stream_chat(message).await?))
    }

    async fn complete_turn(&self, message: &str) -> Result<ChatResponse> {
        self.chat(message).await
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut base_url = base_url.trim().to_string();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    let url = Url::parse(&base_url)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{base_url} cannot be a base URL"), None));
    }
    Ok(url)
}

fn describe_validation_failures(failures: &[serde_json::Value]) -> (String, Option<String>) {
    let mut messages = Vec::new();
    let mut param = None;
    for failure in failures {
        let message = failure
            .get("msg")
            .and_then(|m| m.as_str())
            .unwrap_or("invalid value");
        let location = failure
            .get("loc")
            .and_then(|l| l.as_array())
            .and_then(|l| l.last())
            .map(|l| match l.as_str() {
                Some(s) => s.to_string(),
                None => l.to_string(),
            });
        if param.is_none() {
            param = location.clone();
        }
        match location {
            Some(location) => messages.push(format!("{location}: {message}")),
            None => messages.push(message.to_string()),
        }
    }
    if messages.is_empty() {
        messages.push("validation failed".to_string());
    }
    (messages.join("; "), param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoints_join_under_api_prefix() {
        let client = SoulClient::new(Some("http://soul.local:8000".to_string())).unwrap();
        assert_eq!(
            client.endpoint("chat/stream").unwrap().as_str(),
            "http://soul.local:8000/api/v1/chat/stream"
        );
        let client = SoulClient::new(Some("http://soul.local/proxy/".to_string())).unwrap();
        assert_eq!(
            client.endpoint("trainer/pending").unwrap().as_str(),
            "http://soul.local/proxy/api/v1/trainer/pending"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(SoulClient::new(Some("mailto:soul@example.com".to_string())).is_err());
        assert!(SoulClient::new(Some("not a url".to_string())).is_err());
    }

    #[test]
    fn default_timeout_for_one_shot_calls() {
        let client = SoulClient::new(Some(DEFAULT_BASE_URL.to_string())).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(120));
        let client = SoulClient::with_options(
            Some(DEFAULT_BASE_URL.to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn validation_failures_are_summarized() {
        let failures = json!([
            {"loc": ["body", "message"], "msg": "field required", "type": "missing"},
            {"loc": ["body", 3], "msg": "bad index"}
        ]);
        let (message, param) = describe_validation_failures(failures.as_array().unwrap());
        assert_eq!(message, "message: field required; 3: bad index");
        assert_eq!(param.as_deref(), Some("message"));
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_request() {
        // Nothing listens on this port; validation must fail first.
        let client = SoulClient::new(Some("http://127.0.0.1:9".to_string())).unwrap();
        let err = client.stream_chat("  ").await.err().unwrap();
        assert!(err.is_validation());
        let err = client.chat("").await.unwrap_err();
        assert!(err.is_validation());
    }
}
