//! Response module for insights
//!
//! Typed containers for extracted backend text and the post-processing
//! applied to some kinds before the text reaches the caller.

pub mod parser;

use serde::Serialize;

use crate::request::RequestKind;

/// Extracted backend text, tagged by the kind of request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum AiResponse {
    Interpretation(String),
    Regularised(String),
    Summary(String),
    Insights(String),
    ActionItems(String),
    Answer(String),
}

impl AiResponse {
    pub fn new(kind: RequestKind, text: String) -> Self {
        match kind {
            RequestKind::Describe => Self::Interpretation(text),
            RequestKind::Regularize => Self::Regularised(text),
            RequestKind::Summarize => Self::Summary(text),
            RequestKind::Insights => Self::Insights(text),
            RequestKind::Action => Self::ActionItems(text),
            RequestKind::Qna => Self::Answer(text),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Interpretation(_) => RequestKind::Describe,
            Self::Regularised(_) => RequestKind::Regularize,
            Self::Summary(_) => RequestKind::Summarize,
            Self::Insights(_) => RequestKind::Insights,
            Self::ActionItems(_) => RequestKind::Action,
            Self::Answer(_) => RequestKind::Qna,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Interpretation(text)
            | Self::Regularised(text)
            | Self::Summary(text)
            | Self::Insights(text)
            | Self::ActionItems(text)
            | Self::Answer(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_mirrors_request_kind() {
        for kind in RequestKind::ALL {
            let response = AiResponse::new(kind, "text".to_string());
            assert_eq!(response.kind(), kind);
            assert_eq!(response.content(), "text");
        }
    }
}
