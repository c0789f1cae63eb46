//! HTTP client for the task execution endpoint.
//!
//! This is the fallback request channel used when the realtime session is
//! unavailable: one POST per command, no retry, and no operation timeout, so
//! a request only resolves when the server answers.

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::session::proto::{CommandFrame, TaskReply};

const ERROR_BODY_SNIPPET_LEN: usize = 220;

/// Local development base URL for the task API.
pub const LOCAL_TASK_API_BASE_URL: &str = "http://localhost:8080";

/// Client for one-shot task execution requests.
#[derive(Clone, Debug)]
pub struct TaskApiClient {
    http: Client,
    base_url_override: Option<String>,
}

impl TaskApiClient {
    /// Creates a client targeting the local development base URL.
    pub fn new() -> Result<Self, TaskApiError> {
        let http = Client::builder()
            .no_proxy()
            .build()
            .map_err(TaskApiError::Transport)?;

        Ok(Self {
            http,
            base_url_override: None,
        })
    }

    /// Sets an explicit base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url_override = Some(base_url.trim_end().trim_end_matches('/').to_string());
        self
    }

    /// Executes one task request and awaits the structured reply.
    pub async fn run_task(&self, event: impl Into<String>) -> Result<TaskReply, TaskApiError> {
        let endpoint = format!("{}/run_task", self.base_url());
        let body = CommandFrame::new(event);

        let response = self
            .http
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(TaskApiError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(TaskApiError::Transport)?;

        if !status.is_success() {
            return Err(TaskApiError::HttpStatus {
                status,
                body: summarize_error_body(&body),
            });
        }

        parse_task_reply(&body)
    }

    fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or(LOCAL_TASK_API_BASE_URL)
    }
}

/// Errors produced by the task API client.
#[derive(Debug, Error)]
pub enum TaskApiError {
    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    /// Server answered with a non-success status.
    #[error("http status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    /// Response body did not carry a task reply.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

fn parse_task_reply(body: &str) -> Result<TaskReply, TaskApiError> {
    serde_json::from_str(body).map_err(|err| TaskApiError::Parse(err.to_string()))
}

fn summarize_error_body(body: &str) -> String {
    #[derive(Debug, serde::Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error.or(parsed.message).or(parsed.detail) {
            return message;
        }
    }

    body.chars().take(ERROR_BODY_SNIPPET_LEN).collect()
}
