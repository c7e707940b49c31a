use serde::Serialize;
use serde_json::Value;

use crate::prelude::*;

/// Llama 3 end of turn token. Text completion endpoints keep generating past the assistant
/// turn unless told to stop here.
pub const END_OF_TURN: &str = "<|eot_id|>";

const BEGIN_OF_TEXT: &str = "<|begin_of_text|>";

/// Generation parameters shared by every request style.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Only sent to text completion endpoints.
    pub stop: Vec<String>,
}

impl Parameters {
    /// Default parameters for a request style.
    pub fn for_style(style: Style) -> Self {
        match style {
            Style::Chat => Self {
                max_tokens: 2048,
                temperature: 0.7,
                top_p: 0.9,
                stop: Vec::new(),
            },
            Style::Text => Self {
                max_tokens: 1024,
                temperature: 0.7,
                top_p: 0.9,
                stop: vec![END_OF_TURN.to_string()],
            },
            Style::Raw => Self {
                max_tokens: 256,
                temperature: 0.7,
                top_p: 0.9,
                stop: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatBody<'a> {
    pub messages: &'a [Message],
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Debug, Serialize)]
pub struct TextBody<'a> {
    pub inputs: &'a str,
    pub parameters: TextParameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct TextParameters<'a> {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub stop: &'a [String],
}

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub body: Value,
    /// Prompt that the endpoint may echo back in front of its completion.
    pub prompt: Option<String>,
}

/// Renders the conversation with the Llama 3 chat template, leaving an open assistant turn.
pub fn render_prompt(messages: &[Message]) -> String {
    let mut prompt = String::from(BEGIN_OF_TEXT);

    for message in messages {
        prompt.push_str(&header(message.role.as_str()));
        prompt.push_str(&message.content);
        prompt.push_str(END_OF_TURN);
    }

    prompt.push_str(&header(Role::Assistant.as_str()));
    prompt
}

fn header(role: &str) -> String {
    format!("<|start_header_id|>{role}<|end_header_id|>\n\n")
}

/// Builds the request body for the whole conversation.
///
/// # Errors
///
/// Will return `Err` if the body can't be serialized.
pub fn build(style: Style, messages: &[Message], parameters: &Parameters) -> Result<Payload> {
    match style {
        Style::Chat => {
            let body = ChatBody {
                messages,
                max_tokens: parameters.max_tokens,
                temperature: parameters.temperature,
                top_p: parameters.top_p,
            };

            Ok(Payload {
                body: serde_json::to_value(body)?,
                prompt: None,
            })
        }
        Style::Text => {
            let prompt = render_prompt(messages);
            let body = serde_json::to_value(text_body(&prompt, parameters))?;

            Ok(Payload {
                body,
                prompt: Some(prompt),
            })
        }
        Style::Raw => {
            let prompt = messages
                .iter()
                .rev()
                .find(|message| message.role == Role::User)
                .map(|message| message.content.as_str())
                .unwrap_or_default();

            Ok(Payload {
                body: serde_json::to_value(text_body(prompt, parameters))?,
                prompt: None,
            })
        }
    }
}

fn text_body<'a>(prompt: &'a str, parameters: &'a Parameters) -> TextBody<'a> {
    TextBody {
        inputs: prompt,
        parameters: TextParameters {
            max_new_tokens: parameters.max_tokens,
            temperature: parameters.temperature,
            top_p: parameters.top_p,
            stop: &parameters.stop,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn conversation() -> Conversation {
        let mut conversation = Conversation::with_system("Be brief.");
        conversation.append_user("What is Amazon SageMaker?");
        conversation
    }

    #[test]
    fn chat_body_carries_the_full_history() {
        let payload = build(
            Style::Chat,
            conversation().messages(),
            &Parameters::for_style(Style::Chat),
        )
        .unwrap();

        assert_eq!(payload.prompt, None);
        assert_eq!(
            payload.body,
            json!({
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "What is Amazon SageMaker?"}
                ],
                "max_tokens": 2048,
                "temperature": 0.7f32,
                "top_p": 0.9f32
            })
        );
    }

    #[test]
    fn prompt_template_layout() {
        let prompt = render_prompt(conversation().messages());

        assert_eq!(
            prompt,
            "<|begin_of_text|>\
             <|start_header_id|>system<|end_header_id|>\n\nBe brief.<|eot_id|>\
             <|start_header_id|>user<|end_header_id|>\n\nWhat is Amazon SageMaker?<|eot_id|>\
             <|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn empty_conversation_renders_an_open_assistant_turn() {
        assert_eq!(
            render_prompt(&[]),
            "<|begin_of_text|><|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn text_body_templates_the_prompt_and_stops_at_end_of_turn() {
        let messages = conversation();
        let payload = build(
            Style::Text,
            messages.messages(),
            &Parameters::for_style(Style::Text),
        )
        .unwrap();

        let prompt = render_prompt(messages.messages());
        assert_eq!(payload.prompt.as_deref(), Some(prompt.as_str()));
        assert_eq!(
            payload.body,
            json!({
                "inputs": prompt,
                "parameters": {
                    "max_new_tokens": 1024,
                    "temperature": 0.7f32,
                    "top_p": 0.9f32,
                    "stop": ["<|eot_id|>"]
                }
            })
        );
    }

    #[test]
    fn raw_body_sends_the_latest_user_message_verbatim() {
        let mut messages = conversation();
        messages.append_assistant("A managed ML service.");
        messages.append_user("My name is Julien and I like to");

        let payload = build(
            Style::Raw,
            messages.messages(),
            &Parameters::for_style(Style::Raw),
        )
        .unwrap();

        assert_eq!(payload.prompt, None);
        assert_eq!(payload.body["inputs"], "My name is Julien and I like to");
        assert_eq!(payload.body["parameters"]["max_new_tokens"], 256);
        assert!(payload.body["parameters"].get("stop").is_none());
    }
}
