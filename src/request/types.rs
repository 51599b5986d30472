//! Inbound request model.
//!
//! The wire body is a flat JSON object with an optional `mode` discriminator
//! (default `"structure"`) plus the fields of that mode.  [`RelayRequest`]
//! is the closed set of variants; each one is handled by exactly one
//! assembler/normalizer pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::InputError;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Request kind, fixed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Dictated transcript → SOAP note + recommendations.
    #[default]
    Structure,
    /// Document photo → extracted text.
    Ocr,
    /// Conversational assistant.
    Agent,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Structure => "structure",
            Mode::Ocr => "ocr",
            Mode::Agent => "agent",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structure" => Ok(Mode::Structure),
            "ocr" => Ok(Mode::Ocr),
            "agent" => Ok(Mode::Agent),
            other => Err(InputError::UnknownMode(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Role / ChatTurn
// ---------------------------------------------------------------------------

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of agent-mode history as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-mode requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StructureRequest {
    /// Raw dictation.  Length policy is applied by the assembler.
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OcrRequest {
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub image: Option<String>,
    /// Declared media type; `image/jpeg` when absent.
    #[serde(default)]
    pub media_type: Option<String>,
}

impl OcrRequest {
    pub const DEFAULT_MEDIA_TYPE: &'static str = "image/jpeg";

    pub fn media_type(&self) -> &str {
        self.media_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(Self::DEFAULT_MEDIA_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentRequest {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub patient_context: Option<String>,
    /// Caller's own classification of whether patient data is needed.  The
    /// relay does not re-derive it.  Absent or `null` means `true`.
    #[serde(
        default = "default_needs_patient_data",
        deserialize_with = "true_if_null"
    )]
    pub needs_patient_data: bool,
    #[serde(default)]
    pub conversation_summary: Option<String>,
}

fn default_needs_patient_data() -> bool {
    true
}

fn true_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_needs_patient_data))
}

fn empty_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ChatTurn>, D::Error> {
    Ok(Option::<Vec<ChatTurn>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for AgentRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            patient_context: None,
            needs_patient_data: default_needs_patient_data(),
            conversation_summary: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RelayRequest
// ---------------------------------------------------------------------------

/// A parsed inbound body, one variant per [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    Structure(StructureRequest),
    Ocr(OcrRequest),
    Agent(AgentRequest),
}

impl RelayRequest {
    pub fn mode(&self) -> Mode {
        match self {
            RelayRequest::Structure(_) => Mode::Structure,
            RelayRequest::Ocr(_) => Mode::Ocr,
            RelayRequest::Agent(_) => Mode::Agent,
        }
    }
}
