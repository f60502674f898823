//! Backend adapters: routed request to wire JSON and back

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::llm::{gemini, ollama};
use crate::request::RoutedRequest;
use crate::Result;

/// LLM backends the service can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Multi-part requests: prompt text plus inline image or text
    #[default]
    Gemini,
    /// Flat single-payload requests to a local Ollama server
    Ollama,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translates routed requests into one backend's wire format.
///
/// The variant is fixed when a service is built and never inferred from a
/// request: the two schemas differ structurally (Gemini can combine text
/// and image parts, Ollama carries a single payload field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAdapter {
    Gemini,
    Ollama { model: String },
}

impl BackendAdapter {
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::Ollama {
            model: model.into(),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Gemini => BackendKind::Gemini,
            Self::Ollama { .. } => BackendKind::Ollama,
        }
    }

    /// Build the wire JSON body for `request`.
    pub fn build_request(&self, request: &RoutedRequest) -> Result<String> {
        info!(backend = %self.kind(), kind = %request.response_kind(), "Building request");
        match self {
            Self::Gemini => gemini::build_request(request),
            Self::Ollama { model } => ollama::build_request(model, request),
        }
    }

    /// Extract the reply text from a raw wire reply.
    ///
    /// Fails with `MalformedBackendResponse` when the expected text field is
    /// absent or not a string.
    pub fn get_response(&self, raw_reply: &str) -> Result<String> {
        match self {
            Self::Gemini => gemini::extract_text(raw_reply),
            Self::Ollama { .. } => ollama::extract_text(raw_reply),
        }
    }
}
