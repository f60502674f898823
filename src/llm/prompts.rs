/// Default instructions for whiteboard image description.
pub const DESCRIBE_PROMPT: &str = "Describe this image in detail";

pub const SUMMARISE_PROMPT: &str =
    "Summarize the following chat data into a concise, meaningful summary.";

pub const QUESTION_PROMPT: &str =
    "Answer the user's question. First, classify if the question is 'CONTEXTUAL' or 'GENERIC'.";

/// Sentiment time series over chat messages.
pub const INSIGHTS_PROMPT: &str = "You are performing sentiment analysis on a \
chronological chat conversation.\n\
For each message in the chat:\n\
- Determine the sentiment on a scale from -10.0 to +10.0\n  \
where -10.0 = very negative, 0 = neutral, and +10.0 = very positive.\n\
- Use only the \"message\" field to determine sentiment.\n\
- Preserve the precise timestamp associated with each message.\n\
\n\
Return the output as a JSON array of objects in the exact format below,\n\
without any additional commentary or explanation:\n\
[\n  {\n    \"time\": \"<timestamp>\",\n    \"sentiment\": <float>\n  },\n  ...\n]";

pub const ACTION_ITEMS_PROMPT: &str = "From the following chat transcript, \
identify only the most important and concrete action items.\n\
Rewrite each as a short, clear statement in the third person,\n\
using as few words as possible while keeping full meaning.\n\
Exclude general discussions, suggestions, or decisions;\n\
include only actions that someone explicitly commits to doing.\n\
Return the output strictly as a JSON list of strings and nothing else.";

/// Shape regularisation. The reply is merged back into the input shape.
pub const REGULARISE_PROMPT: &str = "You are given a list of 2D points representing a freehand drawing.\n\
\n\
Your tasks:\n\
1. Use ONLY the provided points.\n\
2. Identify the geometric shape that best matches those points.\n   \
Allowed values (case-sensitive): ELLIPSE, TRIANGLE, RECTANGLE, STRAIGHTLINE.\n\
3. Compute the axis-aligned bounding box of that shape.\n\
4. Output EXACTLY TWO points:\n   \
- First: the top-left coordinate\n   \
- Second: the bottom-right coordinate\n\
\n\
Return ONLY a JSON object with the EXACT structure below:\n\
{\n  \
\"ShapeId\": \"<ShapeId>\",\n  \
\"type\": \"<OneOf: ELLIPSE | TRIANGLE | RECTANGLE | STRAIGHTLINE>\",\n  \
\"Points\": [\n    { \"X\": <number>, \"Y\": <number> },\n    { \"X\": <number>, \"Y\": <number> }\n  ],\n  \
\"Color\": \"<Color>\",\n  \
\"Thickness\": \"<Thickness>\",\n  \
\"CreatedBy\": \"<CreatedBy>\",\n  \
\"LastModifiedBy\": \"<LastModifiedBy>\",\n  \
\"IsDeleted\": <true|false>\n\
}\n\
\n\
STRICT RULES:\n\
- \"Points\" must contain EXACTLY 2 elements.\n\
- Copy ShapeId, Color, Thickness, CreatedBy, LastModifiedBy and IsDeleted verbatim from the input.\n\
- Output must be valid JSON. No explanations. No additional text.\n\
\n\
Use only the points provided below.";

/// Build the question-answering payload from the accumulated context.
pub fn build_question_input(question: &str, accumulated_context: &str) -> String {
    format!("ACCUMULATED_CONTEXT:\n{accumulated_context}\n\nUSER_QUESTION: {question}")
}

/// Payload for a rolling summary update.
pub fn build_rolling_summary_input(previous_summary: &str, new_content: &str) -> String {
    if previous_summary.is_empty() {
        new_content.to_string()
    } else {
        format!("Previous Summary: {previous_summary}\n\nNew Chat Data: {new_content}")
    }
}
