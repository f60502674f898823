use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::OllamaSettings;
use crate::llm::adapter::BackendAdapter;
use crate::llm::client::{malformed, LlmService};
use crate::request::{Payload, RoutedRequest};
use crate::{InsightsError, Result};

/// Client for a local Ollama `/api/generate` endpoint.
pub struct OllamaService {
    http: Client,
    adapter: BackendAdapter,
    endpoint: String,
}

impl OllamaService {
    pub fn new(settings: &OllamaSettings, timeout: Duration) -> Result<Self> {
        let endpoint = settings.endpoint.trim();
        if endpoint.is_empty() {
            return Err(InsightsError::Config("ollama.endpoint is empty".to_string()));
        }

        info!(timeout_secs = timeout.as_secs(), "Initializing Ollama service");

        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            adapter: BackendAdapter::ollama(settings.model.trim()),
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl LlmService for OllamaService {
    fn name(&self) -> &'static str {
        "OllamaService"
    }

    async fn run(&self, request: &RoutedRequest) -> Result<String> {
        let body = self.adapter.build_request(request)?;

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "Ollama responded");

        let raw = response.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), "Ollama API failed: {}", raw);
            return Err(InsightsError::Backend {
                backend: "ollama",
                status: status.as_u16(),
                body: raw,
            });
        }

        let text = self.adapter.get_response(&raw)?;
        info!("Ollama API completed successfully");
        Ok(text)
    }
}

/// Build a flat generate body. Image payloads go to `images`, text payloads
/// to `inputData`; the schema has no way to carry both.
pub(crate) fn build_request(model: &str, request: &RoutedRequest) -> Result<String> {
    let (images, input_data) = match request.payload() {
        Payload::Image(data) => {
            info!("Embedding image in Ollama request");
            (Some(vec![data.as_str()]), None)
        }
        Payload::Text(text) => (None, Some(vec![text.as_str()])),
    };

    let body = OllamaGenerateRequest {
        model,
        prompt: request.prompt(),
        stream: false,
        images,
        input_data,
    };
    Ok(serde_json::to_string(&body)?)
}

/// Read the top-level `response` string.
pub(crate) fn extract_text(raw: &str) -> Result<String> {
    let reply: Value = serde_json::from_str(raw)
        .map_err(|e| malformed(format!("Ollama reply is not JSON: {}", e), raw))?;

    match reply.get("response").and_then(Value::as_str) {
        Some(text) => Ok(text.to_string()),
        None => {
            error!("Invalid Ollama response: {}", raw);
            Err(malformed("no string `response` field", raw))
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
    #[serde(rename = "inputData", skip_serializing_if = "Option::is_none")]
    input_data: Option<Vec<&'a str>>,
}
