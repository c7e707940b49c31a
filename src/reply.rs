//! Normalizes the replies of text generation endpoints into a single displayable string.
//!
//! Endpoints answer with one of a few JSON layouts depending on the serving container:
//!
//! - OpenAI compatible chat completions: `{"choices": [{"message": {"content": ".."}}]}`, where
//!   reasoning models may add `reasoning_content` next to `content`.
//! - Text generation lists: `[{"generated_text": ".."}]`.
//! - Bare text generation objects: `{"generated_text": ".."}`.
//!
//! The raw reply is decoded once into a [`ReplyShape`] and turned into text with a single match.
use serde_json::{Map, Value};

use crate::prelude::*;

/// Returned when no known reply layout carried any text.
pub const NO_CONTENT: &str = "Error: No content generated.";

const REASONING_LABEL: &str = "**Reasoning (truncated):**";
const TRUNCATION_NOTICE: &str = "[Response interrupted due to length limit]";

/// Reply as received from the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// Serialized JSON.
    Bytes(Vec<u8>),
    /// Already parsed JSON.
    Json(Value),
}

impl RawReply {
    /// Parses the reply into a JSON value.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the bytes are not UTF-8 or not valid JSON.
    pub fn into_json(self) -> Result<Value> {
        match self {
            RawReply::Bytes(bytes) => {
                let text = String::from_utf8(bytes)?;
                Ok(serde_json::from_str(&text)?)
            }
            RawReply::Json(value) => Ok(value),
        }
    }
}

impl From<Value> for RawReply {
    fn from(value: Value) -> Self {
        RawReply::Json(value)
    }
}

impl From<Vec<u8>> for RawReply {
    fn from(bytes: Vec<u8>) -> Self {
        RawReply::Bytes(bytes)
    }
}

/// The known reply layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyShape {
    /// `choices[0].message` was present.
    ChatCompletion {
        content: Option<String>,
        reasoning: Option<String>,
    },
    /// A `choices` field without a usable first message.
    ChoicesWithoutMessage,
    /// `[{"generated_text": ..}, ..]`
    GeneratedList(Option<String>),
    /// `{"generated_text": ..}`
    Generated(Option<String>),
    UnrecognizedShape,
}

impl ReplyShape {
    /// Decodes a JSON reply. Checks run in priority order and the first match wins.
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Object(object) if object.contains_key("choices") => {
                match object
                    .get("choices")
                    .and_then(Value::as_array)
                    .and_then(|choices| choices.first())
                    .and_then(|choice| choice.get("message"))
                    .and_then(Value::as_object)
                {
                    Some(message) => ReplyShape::ChatCompletion {
                        content: text_field(message, "content"),
                        reasoning: text_field(message, "reasoning_content"),
                    },
                    None => ReplyShape::ChoicesWithoutMessage,
                }
            }
            Value::Array(items) => match items.first() {
                Some(Value::Object(item)) => {
                    ReplyShape::GeneratedList(text_field(item, "generated_text"))
                }
                _ => ReplyShape::UnrecognizedShape,
            },
            Value::Object(object) if object.contains_key("generated_text") => {
                ReplyShape::Generated(text_field(object, "generated_text"))
            }
            _ => ReplyShape::UnrecognizedShape,
        }
    }

    /// Returns the text carried by the reply, if any.
    ///
    /// Non-empty `content` always wins. Reasoning is only surfaced when the model ran out of
    /// tokens before producing its final answer.
    pub fn into_text(self) -> Option<String> {
        match self {
            ReplyShape::ChatCompletion { content, reasoning } => match (content, reasoning) {
                (Some(content), _) if !content.is_empty() => Some(content),
                (_, Some(reasoning)) if !reasoning.is_empty() => Some(format!(
                    "{REASONING_LABEL}\n{reasoning}\n\n{TRUNCATION_NOTICE}"
                )),
                (content, _) => content,
            },
            ReplyShape::GeneratedList(text) | ReplyShape::Generated(text) => text,
            ReplyShape::ChoicesWithoutMessage | ReplyShape::UnrecognizedShape => None,
        }
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(String::from)
}

/// Turns a raw endpoint reply into the text to show to the user.
///
/// `echoed_prompt` is the prompt sent to a text completion endpoint. Those endpoints may return
/// the prompt concatenated with the completion, so the prompt is stripped from the front of the
/// reply and the rest is trimmed.
///
/// The result is never empty: when no text can be found [`NO_CONTENT`] is returned.
///
/// # Errors
///
/// Will return `Err` if a byte reply can't be decoded as JSON.
pub fn normalize(raw: RawReply, echoed_prompt: Option<&str>) -> Result<String> {
    let value = raw.into_json()?;

    match &value {
        Value::Object(object) => {
            log::debug!("reply keys: {:?}", object.keys().collect::<Vec<_>>())
        }
        _ => log::debug!("reply keys: list"),
    }

    let shape = ReplyShape::decode(&value);

    match &shape {
        ReplyShape::ChatCompletion {
            reasoning: Some(reasoning),
            content,
        } if !reasoning.is_empty() => {
            log::debug!("reasoning content found ({} chars)", reasoning.len());
            if content.as_deref().map_or(true, str::is_empty) {
                log::debug!("content is empty, using reasoning content as fallback");
            }
        }
        ReplyShape::ChoicesWithoutMessage | ReplyShape::UnrecognizedShape => {
            log::debug!("failed to extract content, raw data: {value}");
        }
        _ => {}
    }

    let text = match (shape.into_text(), echoed_prompt) {
        (Some(text), Some(prompt)) if !text.is_empty() => Some(strip_echo(&text, prompt)),
        (text, _) => text,
    };

    Ok(text
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_CONTENT.to_string()))
}

fn strip_echo(text: &str, prompt: &str) -> String {
    text.strip_prefix(prompt).unwrap_or(text).trim().to_string()
}
