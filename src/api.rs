use crate::config::Config;
use crate::error::ApiError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Duration;

/// Number of passages the service retrieves per question. Not user-configurable.
pub const TOP_K: u32 = 5;

/// Body of `POST /ask`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub query: String,
    pub top_k: u32,
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: TOP_K,
        }
    }
}

/// The single citation attached to an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySource {
    pub url: String,
    pub title: String,
    pub chunk_index: i64,
}

/// Fields of a successful answer that the client consumes.
///
/// The service sends more (`sources`, `matched_chunks`, `success`, ...);
/// those are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub primary_source: Option<PrimarySource>,
    #[serde(default)]
    pub is_out_of_scope: Option<bool>,
    #[serde(default)]
    pub query_time: Option<f64>,
}

/// Raw HTTP outcome before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers one ask request to the service.
///
/// Implementations only report transport-level failures as errors; every
/// response that carries a status, successful or not, is an `Ok(HttpReply)`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_ask(&self, request: &AskRequest) -> Result<HttpReply, ApiError>;
}

/// Question-answering client. Cheap to clone.
#[derive(Clone)]
pub struct QaClient {
    transport: Arc<dyn Transport>,
}

impl QaClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client talking HTTP to the endpoint named by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Send one question and interpret the reply. Never retries.
    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ApiError> {
        let reply = self.transport.post_ask(request).await?;
        interpret(reply)
    }
}

/// Turn a raw reply into an answer or a normalized failure.
pub fn interpret(reply: HttpReply) -> Result<AskResponse, ApiError> {
    if !reply.is_success() {
        return Err(ApiError::from_status(reply.status, &reply.body));
    }

    serde_json::from_str::<AskResponse>(&reply.body).map_err(|e| ApiError::MalformedResponse {
        reason: e.to_string(),
    })
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.ask_url(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_ask(&self, request: &AskRequest) -> Result<HttpReply, ApiError> {
        tracing::debug!(url = %self.url, top_k = request.top_k, "posting question");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            // An unreadable error body is treated as empty; the status still decides.
            Err(e) if !(200..300).contains(&status) => {
                tracing::warn!(status, error = %e, "failed to read error body");
                String::new()
            }
            Err(e) => return Err(transport_error(e)),
        };

        Ok(HttpReply::new(status, body))
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_connect() {
        tracing::warn!(error = %err, "backend unreachable");
        ApiError::Unreachable
    } else {
        ApiError::from_transport(&err.to_string())
    }
}
