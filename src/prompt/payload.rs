//! The assembled upstream request.
//!
//! [`PromptPayload`] is built once per request by the assembler and only
//! read afterwards; it has no mutating methods.  [`PromptPayload::to_request_body`]
//! renders it in the completion API's wire format.

use serde_json::{json, Value};

use crate::request::Role;

/// One system-prompt segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemBlock {
    pub text: String,
    /// Marked with an ephemeral cache breakpoint when `true`.
    pub cacheable: bool,
}

impl SystemBlock {
    pub fn cached(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cacheable: true,
        }
    }
}

/// Content of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Element of a multi-part turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Base64 image with its declared media type.
    Image { media_type: String, data: String },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Text of a plain-text turn; `None` for multi-part turns.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text(text) => Some(text),
            TurnContent::Parts(_) => None,
        }
    }
}

/// Complete upstream request for one inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    model: String,
    max_tokens: u32,
    system: Vec<SystemBlock>,
    messages: Vec<Turn>,
}

impl PromptPayload {
    pub fn new(
        model: impl Into<String>,
        max_tokens: u32,
        system: Vec<SystemBlock>,
        messages: Vec<Turn>,
    ) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system,
            messages,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn system(&self) -> &[SystemBlock] {
        &self.system
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    /// Render as a Messages API request body.
    pub fn to_request_body(&self) -> Value {
        let system: Vec<Value> = self
            .system
            .iter()
            .map(|block| {
                let mut value = json!({ "type": "text", "text": block.text });
                if block.cacheable {
                    value["cache_control"] = json!({ "type": "ephemeral" });
                }
                value
            })
            .collect();

        let messages: Vec<Value> = self
            .messages
            .iter()
            .map(|turn| {
                let content = match &turn.content {
                    TurnContent::Text(text) => Value::String(text.clone()),
                    TurnContent::Parts(parts) => {
                        Value::Array(parts.iter().map(part_to_value).collect())
                    }
                };
                json!({ "role": turn.role.as_str(), "content": content })
            })
            .collect();

        json!({
            "model":      self.model,
            "max_tokens": self.max_tokens,
            "system":     system,
            "messages":   messages
        })
    }
}

fn part_to_value(part: &ContentPart) -> Value {
    match part {
        ContentPart::Image { media_type, data } => json!({
            "type": "image",
            "source": { "type": "base64", "media_type": media_type, "data": data }
        }),
        ContentPart::Text(text) => json!({ "type": "text", "text": text }),
    }
}
