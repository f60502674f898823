use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::GeminiSettings;
use crate::credentials::{mask_key, CredentialPool};
use crate::llm::adapter::BackendAdapter;
use crate::llm::client::{malformed, LlmService};
use crate::request::{Payload, RoutedRequest};
use crate::{InsightsError, Result};

const IMAGE_MIME_TYPE: &str = "image/png";
const TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Gemini `generateContent` client drawing keys from a shared rotating pool.
pub struct GeminiService {
    http: Client,
    pool: Arc<CredentialPool>,
    model: String,
    endpoint: String,
}

impl GeminiService {
    pub fn new(
        settings: &GeminiSettings,
        timeout: Duration,
        pool: Arc<CredentialPool>,
    ) -> Result<Self> {
        let model = settings.model.trim();
        if model.is_empty() {
            return Err(InsightsError::Config("gemini.model is empty".to_string()));
        }

        info!(timeout_secs = timeout.as_secs(), "Initializing Gemini service");

        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            pool,
            model: model.to_string(),
            endpoint: settings.endpoint.trim().trim_end_matches('/').to_string(),
        })
    }

    fn request_url(&self, key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, key
        )
    }
}

#[async_trait]
impl LlmService for GeminiService {
    fn name(&self) -> &'static str {
        "GeminiService"
    }

    /// Try each key at most once, rotating past keys that report 429 or 403.
    async fn run(&self, request: &RoutedRequest) -> Result<String> {
        let adapter = BackendAdapter::Gemini;
        let body = adapter.build_request(request)?;
        let max_attempts = self.pool.len();

        for attempt in 0..max_attempts {
            let key = self.pool.snapshot();
            debug!(attempt, key = %mask_key(key.key), "Sending Gemini request");

            let response = self
                .http
                .post(self.request_url(key.key))
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone())
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let raw = response.text().await?;
                return adapter.get_response(&raw);
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
                warn!(status = status.as_u16(), key = %mask_key(key.key), "Key limit hit");
                self.pool.rotate_from(key);
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Gemini API failed: {}", body);
            return Err(InsightsError::Backend {
                backend: "gemini",
                status: status.as_u16(),
                body,
            });
        }

        Err(InsightsError::RateLimitExceeded(format!(
            "all {} Gemini API keys are rate limited",
            max_attempts
        )))
    }
}

/// Build a `generateContent` body: the prompt part followed by either an
/// inline PNG part or a second text part.
pub(crate) fn build_request(request: &RoutedRequest) -> Result<String> {
    let mut parts = vec![Part::Text {
        text: request.prompt(),
    }];

    match request.payload() {
        Payload::Image(data) => {
            info!("Embedding image in Gemini request");
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: IMAGE_MIME_TYPE,
                    data,
                },
            });
        }
        Payload::Text(text) => {
            info!("Embedding text input data in Gemini request");
            parts.push(Part::Text { text });
        }
    }

    let body = GeminiGenerateContentRequest {
        contents: vec![GeminiContent { parts }],
    };
    Ok(serde_json::to_string(&body)?)
}

/// Read `candidates[0].content.parts[0].text`.
pub(crate) fn extract_text(raw: &str) -> Result<String> {
    let reply: Value = serde_json::from_str(raw)
        .map_err(|e| malformed(format!("Gemini reply is not JSON: {}", e), raw))?;

    match reply.pointer(TEXT_POINTER).and_then(Value::as_str) {
        Some(text) => {
            info!("Response is textual, extracting text");
            Ok(text.to_string())
        }
        None => {
            error!("No text in Gemini response: {}", raw);
            Err(malformed(
                "no text at candidates[0].content.parts[0].text",
                raw,
            ))
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiGenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{route, Request};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

    fn service(server: &MockServer, keys: &[&str]) -> (GeminiService, Arc<CredentialPool>) {
        let pool = Arc::new(
            CredentialPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap(),
        );
        let settings = GeminiSettings {
            endpoint: server.uri(),
            ..GeminiSettings::default()
        };
        let service = GeminiService::new(&settings, Duration::from_secs(5), pool.clone()).unwrap();
        (service, pool)
    }

    fn hi_reply() -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": "Hi"}]}}]})
    }

    #[test]
    fn extract_text_reads_first_part() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hi"},{"text":"ignored"}]}}]}"#;
        assert_eq!(extract_text(raw).unwrap(), "Hi");
    }

    #[test]
    fn extract_text_rejects_missing_or_non_string_text() {
        for raw in [
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":42}]}}]}"#,
            r#"{"error":{"code":400}}"#,
            "not json",
        ] {
            match extract_text(raw) {
                Err(InsightsError::MalformedBackendResponse { raw: reply, .. }) => {
                    assert_eq!(reply, raw)
                }
                other => panic!("expected malformed response error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn rotates_past_rate_limited_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "key-1"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "key-2"))
            .and(body_partial_json(json!({"contents": [{"parts": [{"text": "Summarize"}, {"text": "hello"}]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(hi_reply()))
            .expect(1)
            .mount(&server)
            .await;

        let (service, pool) = service(&server, &["key-1", "key-2"]);
        let routed = route(&Request::new("SUM", "Summarize", "hello")).unwrap();

        assert_eq!(service.run(&routed).await.unwrap(), "Hi");
        assert_eq!(pool.cursor(), 1);
        assert_eq!(pool.current_key(), "key-2");
    }

    #[tokio::test]
    async fn exhausting_every_key_is_rate_limit_exceeded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let (service, pool) = service(&server, &["a", "b", "c"]);
        let routed = route(&Request::summarise("chat")).unwrap();

        let err = service.run(&routed).await.unwrap_err();
        assert!(matches!(err, InsightsError::RateLimitExceeded(_)));
        assert_eq!(pool.cursor(), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let (service, pool) = service(&server, &["a", "b"]);
        let routed = route(&Request::summarise("chat")).unwrap();

        match service.run(&routed).await.unwrap_err() {
            InsightsError::Backend { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected backend error, got {:?}", other),
        }
        assert_eq!(pool.cursor(), 0);
    }

    #[tokio::test]
    async fn malformed_success_reply_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let (service, _) = service(&server, &["a"]);
        let routed = route(&Request::summarise("chat")).unwrap();

        let err = service.run(&routed).await.unwrap_err();
        assert!(matches!(err, InsightsError::MalformedBackendResponse { .. }));
    }
}
