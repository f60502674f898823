//! High-level client over the shared AI service handle

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::instance::{self, ServiceHandle};
use crate::llm::prompts::build_rolling_summary_input;
use crate::request::Request;
use crate::Result;

/// Meeting-facing operations: whiteboard description, shape regularisation,
/// sentiment, rolling summaries, action items and Q&A.
pub struct InsightsClient {
    handle: Arc<ServiceHandle>,
    summary: Mutex<String>,
    qa_turn: Mutex<()>,
}

impl InsightsClient {
    pub fn new(handle: Arc<ServiceHandle>) -> Self {
        Self {
            handle,
            summary: Mutex::new(String::new()),
            qa_turn: Mutex::new(()),
        }
    }

    /// Client over the process-wide service instance.
    pub async fn from_instance() -> Result<Self> {
        Ok(Self::new(instance::instance().await?))
    }

    pub fn handle(&self) -> &Arc<ServiceHandle> {
        &self.handle
    }

    /// Describe a base64 encoded PNG.
    pub async fn describe(&self, image_base64: &str) -> Result<String> {
        self.handle.process(Request::describe(image_base64)).await
    }

    /// Read a PNG from disk and describe it, optionally with custom instructions.
    pub async fn describe_file(&self, path: &Path, prompt: Option<&str>) -> Result<String> {
        info!(path = %path.display(), "Reading image, converting it to base64");
        let bytes = tokio::fs::read(path).await?;
        let image = STANDARD.encode(bytes);

        let request = match prompt {
            Some(prompt) => Request::describe_with_prompt(image, prompt),
            None => Request::describe(image),
        };
        self.handle.process(request).await
    }

    /// Snap a freehand shape to the closest regular shape.
    pub async fn regularise(&self, shape_json: &str) -> Result<String> {
        self.handle.process(Request::regularise(shape_json)).await
    }

    /// Sentiment time series as a JSON array string.
    pub async fn sentiment(&self, chat: &Value) -> Result<String> {
        self.handle.process(Request::insights(chat)).await
    }

    pub async fn action_items(&self, chat: &Value) -> Result<String> {
        self.handle.process(Request::action_items(chat)).await
    }

    /// Fold `content` into the rolling summary and return the new summary.
    ///
    /// Updates are applied one at a time, in call order.
    pub async fn summarise(&self, content: &str) -> Result<String> {
        let mut summary = self.summary.lock().await;
        let input = build_rolling_summary_input(&summary, content);

        let updated = self.handle.process(Request::summarise(input)).await?;
        *summary = updated.clone();
        Ok(updated)
    }

    pub async fn accumulated_summary(&self) -> String {
        self.summary.lock().await.clone()
    }

    pub async fn clear_summary(&self) -> &'static str {
        self.summary.lock().await.clear();
        "Summary cleared successfully"
    }

    /// Answer `question` against the summary, after pending summary updates.
    pub async fn answer_question(&self, question: &str) -> Result<String> {
        let _turn = self.qa_turn.lock().await;
        let context = self.summary.lock().await.clone();
        self.handle
            .process(Request::question(question, &context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llm::BackendKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ollama_client(server: &MockServer) -> InsightsClient {
        let mut settings = Settings::default();
        settings.llm.backend = BackendKind::Ollama;
        settings.ollama.endpoint = format!("{}/api/generate", server.uri());
        InsightsClient::new(Arc::new(ServiceHandle::from_settings(&settings).unwrap()))
    }

    async fn reply_to(server: &MockServer, input: &str, response: &str) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"inputData": [input]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": response})))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn rolling_summary_feeds_previous_summary_and_questions() {
        let server = MockServer::start().await;
        reply_to(&server, "first chat", "S1").await;
        reply_to(
            &server,
            "Previous Summary: S1\n\nNew Chat Data: second chat",
            "S2",
        )
        .await;
        reply_to(
            &server,
            "ACCUMULATED_CONTEXT:\nS2\n\nUSER_QUESTION: What was decided?",
            "Ship it",
        )
        .await;

        let client = ollama_client(&server);
        assert_eq!(client.summarise("first chat").await.unwrap(), "S1");
        assert_eq!(client.summarise("second chat").await.unwrap(), "S2");
        assert_eq!(
            client.answer_question("What was decided?").await.unwrap(),
            "Ship it"
        );

        client.clear_summary().await;
        assert_eq!(client.accumulated_summary().await, "");
    }

    #[tokio::test]
    async fn describe_file_sends_base64_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "prompt": "What is drawn?",
                "images": ["iVBORw=="]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "A box"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("board.png");
        std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

        let client = ollama_client(&server);
        let text = client
            .describe_file(&image, Some("What is drawn?"))
            .await
            .unwrap();
        assert_eq!(text, "A box");
    }

    #[tokio::test]
    async fn sentiment_output_is_validated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "I feel good"})),
            )
            .mount(&server)
            .await;

        let client = ollama_client(&server);
        let chat = json!([{"time": "2025-01-01T10:00:00Z", "message": "great"}]);
        let err = client.sentiment(&chat).await.unwrap_err();
        assert!(matches!(err, crate::InsightsError::InvalidModelOutput(_)));
    }
}
