use crate::prelude::*;
use crate::reply;
use crate::request::{self, Parameters};

/// Everything a turn needs to reach the endpoint.
#[derive(Debug, Clone)]
pub struct Session<E> {
    endpoint: E,
    style: Style,
    parameters: Parameters,
}

impl<E: Endpoint> Session<E> {
    pub fn new(endpoint: E, style: Style, parameters: Parameters) -> Self {
        Self {
            endpoint,
            style,
            parameters,
        }
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Sends the whole conversation to the endpoint and returns the normalized reply.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the request fails or the reply isn't JSON.
    pub fn complete(&self, conversation: &Conversation) -> Result<String> {
        let payload = request::build(self.style, conversation.messages(), &self.parameters)?;
        log::debug!("request body: {:#?}", payload.body);

        let raw = self.endpoint.invoke(&payload.body)?;

        reply::normalize(raw, payload.prompt.as_deref())
    }

    /// Completes the conversation and appends the reply as an assistant message.
    ///
    /// Failures never escape: they are appended as an `Error: ..` assistant message instead.
    pub fn respond<'a>(&self, conversation: &'a mut Conversation) -> &'a Message {
        log::info!("invoking model with {} messages", conversation.len());

        let content = match self.complete(conversation) {
            Ok(content) => content,
            Err(e) => {
                log::error!("error invoking endpoint: {e}");
                format!("Error: {e}")
            }
        };

        conversation.append_assistant(content)
    }
}
