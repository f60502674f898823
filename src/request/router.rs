//! Normalizes inbound requests into the backend-agnostic routed shape

use serde::Serialize;
use tracing::debug;

use crate::llm::prompts;
use crate::request::RequestKind;
use crate::response::{self, AiResponse};
use crate::Result;

/// An inbound request: a type tag, instruction text and a payload.
///
/// The payload is base64 image data for `DESCRIBE` and text for every other
/// kind; routing decides which slot it lands in from the tag alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub request_type: String,
    pub context: String,
    pub payload: String,
}

/// The single payload carried by a routed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Image(String),
    Text(String),
}

/// Backend-agnostic request, ready for adapter translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedRequest {
    prompt: String,
    payload: Payload,
    response_kind: RequestKind,
}

impl Request {
    pub fn new(
        request_type: impl Into<String>,
        context: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            request_type: request_type.into(),
            context: context.into(),
            payload: payload.into(),
        }
    }

    fn of(kind: RequestKind, context: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(kind.as_str(), context, payload)
    }

    /// Describe a base64 encoded PNG.
    pub fn describe(image_base64: impl Into<String>) -> Self {
        Self::of(RequestKind::Describe, prompts::DESCRIBE_PROMPT, image_base64)
    }

    /// Describe a base64 encoded PNG with custom instructions.
    pub fn describe_with_prompt(image_base64: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::of(RequestKind::Describe, prompt, image_base64)
    }

    /// Regularise a freehand shape given as JSON.
    pub fn regularise(shape_json: impl Into<String>) -> Self {
        Self::of(RequestKind::Regularize, prompts::REGULARISE_PROMPT, shape_json)
    }

    /// Sentiment time series over chat messages.
    pub fn insights(chat: &serde_json::Value) -> Self {
        Self::of(RequestKind::Insights, prompts::INSIGHTS_PROMPT, chat.to_string())
    }

    pub fn summarise(content: impl Into<String>) -> Self {
        Self::of(RequestKind::Summarize, prompts::SUMMARISE_PROMPT, content)
    }

    pub fn action_items(chat: &serde_json::Value) -> Self {
        Self::of(RequestKind::Action, prompts::ACTION_ITEMS_PROMPT, chat.to_string())
    }

    /// Answer `question` using `accumulated_context` as background.
    pub fn question(question: &str, accumulated_context: &str) -> Self {
        Self::of(
            RequestKind::Qna,
            prompts::QUESTION_PROMPT,
            prompts::build_question_input(question, accumulated_context),
        )
    }
}

/// Route an inbound request.
///
/// Fails with `UnsupportedRequestType` for an unknown tag.
pub fn route(request: &Request) -> Result<RoutedRequest> {
    let kind: RequestKind = request.request_type.parse()?;
    debug!(kind = %kind, "Routing request");

    let payload = if kind.carries_image() {
        Payload::Image(request.payload.clone())
    } else {
        Payload::Text(request.payload.clone())
    };

    Ok(RoutedRequest {
        prompt: request.context.clone(),
        payload,
        response_kind: kind,
    })
}

impl RoutedRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn image_data(&self) -> Option<&str> {
        match &self.payload {
            Payload::Image(data) => Some(data),
            Payload::Text(_) => None,
        }
    }

    pub fn text_data(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(data) => Some(data),
            Payload::Image(_) => None,
        }
    }

    pub fn response_kind(&self) -> RequestKind {
        self.response_kind
    }

    /// Wrap extracted backend text in the container for this request's kind.
    pub fn wrap_response(&self, text: String) -> AiResponse {
        AiResponse::new(self.response_kind, text)
    }

    /// Post-process a response into the string handed back to the caller.
    pub fn format_output(&self, response: &AiResponse) -> Result<String> {
        match response {
            AiResponse::Regularised(text) => {
                response::parser::merge_regularised(self.text_data().unwrap_or_default(), text)
            }
            AiResponse::Insights(text) => response::parser::parse_sentiment(text),
            other => Ok(other.content().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InsightsError;

    #[test]
    fn describe_routes_payload_to_image_slot() {
        let routed = route(&Request::new("DESCRIBE", "Describe", "abc123")).unwrap();

        assert_eq!(routed.image_data(), Some("abc123"));
        assert_eq!(routed.text_data(), None);
        assert_eq!(routed.response_kind(), RequestKind::Describe);
        assert_eq!(routed.prompt(), "Describe");
    }

    #[test]
    fn text_kinds_route_payload_to_text_slot() {
        for kind in RequestKind::ALL.into_iter().filter(|k| !k.carries_image()) {
            let routed = route(&Request::new(kind.as_str(), "p", "hello")).unwrap();
            assert_eq!(routed.text_data(), Some("hello"));
            assert_eq!(routed.image_data(), None);
            assert_eq!(routed.response_kind(), kind);
        }
    }

    #[test]
    fn unknown_type_fails() {
        let err = route(&Request::new("POEM", "p", "x")).unwrap_err();
        assert!(matches!(err, InsightsError::UnsupportedRequestType(_)));
    }

    #[test]
    fn question_payload_embeds_context() {
        let routed = route(&Request::question("Who?", "Alice spoke")).unwrap();
        assert_eq!(
            routed.text_data(),
            Some("ACCUMULATED_CONTEXT:\nAlice spoke\n\nUSER_QUESTION: Who?")
        );
    }

    #[test]
    fn chat_requests_serialize_json_payload() {
        let chat = serde_json::json!([{"time": "2025-01-01T10:00:00Z", "message": "hi"}]);
        let routed = route(&Request::action_items(&chat)).unwrap();
        assert_eq!(routed.text_data(), Some(chat.to_string().as_str()));
        assert_eq!(routed.response_kind(), RequestKind::Action);
    }

    #[test]
    fn plain_kinds_format_as_is() {
        let routed = route(&Request::summarise("chat")).unwrap();
        let response = routed.wrap_response("short summary".to_string());
        assert!(matches!(response, AiResponse::Summary(_)));
        assert_eq!(routed.format_output(&response).unwrap(), "short summary");
    }
}
