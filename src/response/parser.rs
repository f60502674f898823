//! Parsers for structured model output

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{InsightsError, Result};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const TIME_LAYOUT: &[u8; 20] = b"dddd-dd-ddTdd:dd:ddZ";
const SENTIMENT_RANGE: std::ops::RangeInclusive<f64> = -10.0..=10.0;

/// Caller-owned shape metadata that must survive regularisation untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ShapeInput {
    shape_id: Value,
    #[serde(rename = "Type", default)]
    kind: Value,
    color: Value,
    thickness: Value,
    created_by: Value,
    last_modified_by: Value,
    is_deleted: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ShapeOutput {
    shape_id: Value,
    #[serde(rename = "Type")]
    kind: Value,
    points: Vec<Value>,
    color: Value,
    thickness: Value,
    created_by: Value,
    last_modified_by: Value,
    is_deleted: Value,
}

/// Merge the model's regularised shape into the caller's input shape.
///
/// Only the shape type and the first two points are taken from the model.
/// If the model output is unusable the input is returned unchanged.
pub fn merge_regularised(input_json: &str, model_output: &str) -> Result<String> {
    info!("Starting regularisation output parsing");
    let input: ShapeInput = serde_json::from_str(input_json)?;

    let Some(model) = parse_model_object(model_output) else {
        info!("Inconsistent AI response for regularisation");
        return Ok(input_json.to_string());
    };

    let points = match model.get("Points").and_then(Value::as_array) {
        Some(points) if points.len() >= 2 => points[..2].to_vec(),
        _ => {
            info!("Regularisation output has fewer than two points");
            return Ok(input_json.to_string());
        }
    };

    let kind = model
        .get("type")
        .or_else(|| model.get("Type"))
        .cloned()
        .unwrap_or(input.kind);

    let output = ShapeOutput {
        shape_id: input.shape_id,
        kind,
        points,
        color: input.color,
        thickness: input.thickness,
        created_by: input.created_by,
        last_modified_by: input.last_modified_by,
        is_deleted: input.is_deleted,
    };

    Ok(serde_json::to_string(&output)?)
}

fn parse_model_object(model_output: &str) -> Option<serde_json::Map<String, Value>> {
    let cleaned = model_output.trim();
    if !cleaned.contains('{') {
        return None;
    }

    let cleaned = if cleaned.starts_with("```") {
        cleaned.replace("```json", "").replace("```", "")
    } else {
        cleaned.to_string()
    };

    match serde_json::from_str::<Value>(cleaned.trim()) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            info!("Regularisation response is not a JSON object");
            None
        }
        Err(e) => {
            warn!("Failed to parse regularisation output: {}", e);
            None
        }
    }
}

/// One point of the sentiment time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentEntry {
    pub time: String,
    pub sentiment: f64,
}

/// Validate a sentiment series and return it without Markdown fences.
pub fn parse_sentiment(raw: &str) -> Result<String> {
    let cleaned = strip_code_fences(raw.trim());

    if !cleaned.starts_with('[') || !cleaned.ends_with(']') {
        return Err(InsightsError::InvalidModelOutput(
            "sentiment output is not a JSON array".to_string(),
        ));
    }

    let entries: Vec<SentimentEntry> = serde_json::from_str(cleaned).map_err(|e| {
        InsightsError::InvalidModelOutput(format!("expected [{{time, sentiment}}]: {}", e))
    })?;

    for entry in &entries {
        validate_entry(entry)?;
    }

    Ok(cleaned.to_string())
}

fn validate_entry(entry: &SentimentEntry) -> Result<()> {
    if !is_fixed_width_timestamp(&entry.time)
        || NaiveDateTime::parse_from_str(&entry.time, TIME_FORMAT).is_err()
    {
        return Err(InsightsError::InvalidModelOutput(format!(
            "invalid time format: {}",
            entry.time
        )));
    }
    if !SENTIMENT_RANGE.contains(&entry.sentiment) {
        return Err(InsightsError::InvalidModelOutput(format!(
            "sentiment out of range [-10, 10]: {}",
            entry.sentiment
        )));
    }
    Ok(())
}

/// chrono accepts unpadded fields; the series requires `YYYY-MM-DDTHH:MM:SSZ` exactly.
fn is_fixed_width_timestamp(time: &str) -> bool {
    time.len() == TIME_LAYOUT.len()
        && time
            .bytes()
            .zip(TIME_LAYOUT.iter())
            .all(|(b, &l)| if l == b'd' { b.is_ascii_digit() } else { b == l })
}

fn strip_code_fences(input: &str) -> &str {
    let s = input
        .strip_prefix("```json")
        .or_else(|| input.strip_prefix("```"))
        .unwrap_or(input)
        .trim();
    s.strip_suffix("```").unwrap_or(s).trim()
}
