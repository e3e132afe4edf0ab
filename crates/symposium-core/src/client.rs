//! Boundary to the completion backend.
//!
//! One request per user submission. The body that comes back is handed to
//! the envelope parser untouched, so this layer deals only in raw strings.

use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::store::HistoryEntry;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// Non-success HTTP status. The backend reports its own failures with a
    /// decodable apology envelope in the body, so it is kept around.
    #[error("completion endpoint returned status {status}")]
    Status { status: u16, body: Option<String> },
    #[error("completion request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

pub trait CompletionClient: Send + Sync + 'static {
    /// Send the full conversation history and return the raw response body.
    fn complete(
        &self,
        history: Vec<HistoryEntry>,
    ) -> BoxFuture<'static, Result<String, CompletionError>>;
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<HistoryEntry>,
}

/// HTTP client for the hosted assistant endpoint.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: Client,
    base_url: String,
}

impl HttpCompletionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(
        &self,
        history: Vec<HistoryEntry>,
    ) -> BoxFuture<'static, Result<String, CompletionError>> {
        let client = self.client.clone();
        let url = format!("{}/api/chat", self.base_url);

        Box::pin(async move {
            let response = client
                .post(&url)
                .json(&ChatRequest { messages: history })
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.ok();
                return Err(CompletionError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(response.text().await?)
        })
    }
}
