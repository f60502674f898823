//! Request kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::InsightsError;

/// Kind of work an inbound request asks for. Also selects the response container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestKind {
    /// Describe a whiteboard image
    Describe,
    /// Snap a freehand shape to a regular one
    Regularize,
    /// Summarise chat or meeting text
    Summarize,
    /// Sentiment time series over a chat
    Insights,
    /// Extract action items from a chat
    Action,
    /// Answer a question against the accumulated context
    Qna,
}

impl RequestKind {
    pub const ALL: [RequestKind; 6] = [
        Self::Describe,
        Self::Regularize,
        Self::Summarize,
        Self::Insights,
        Self::Action,
        Self::Qna,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Describe => "DESCRIBE",
            Self::Regularize => "REGULARIZE",
            Self::Summarize => "SUMMARIZE",
            Self::Insights => "INSIGHTS",
            Self::Action => "ACTION",
            Self::Qna => "QNA",
        }
    }

    /// Whether the payload of this kind is base64 image data rather than text.
    pub fn carries_image(&self) -> bool {
        matches!(self, Self::Describe)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = InsightsError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "DESC" | "DESCRIBE" => Ok(Self::Describe),
            "REG" | "REGULARIZE" | "REGULARISE" => Ok(Self::Regularize),
            "SUM" | "SUMMARIZE" | "SUMMARISE" => Ok(Self::Summarize),
            "INS" | "INSIGHTS" => Ok(Self::Insights),
            "ACTION" => Ok(Self::Action),
            "QNA" | "QA" => Ok(Self::Qna),
            _ => Err(InsightsError::UnsupportedRequestType(tag.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_tags_parse() {
        assert_eq!("DESC".parse::<RequestKind>().unwrap(), RequestKind::Describe);
        assert_eq!("regularise".parse::<RequestKind>().unwrap(), RequestKind::Regularize);
        assert_eq!("SUM".parse::<RequestKind>().unwrap(), RequestKind::Summarize);
        assert_eq!("INS".parse::<RequestKind>().unwrap(), RequestKind::Insights);
        assert_eq!("QA".parse::<RequestKind>().unwrap(), RequestKind::Qna);
    }

    #[test]
    fn canonical_names_round_trip() {
        for kind in RequestKind::ALL {
            assert_eq!(kind.as_str().parse::<RequestKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "TRANSLATE".parse::<RequestKind>().unwrap_err();
        assert!(matches!(err, InsightsError::UnsupportedRequestType(tag) if tag == "TRANSLATE"));
    }
}
