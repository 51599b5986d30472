//! Mode-specific prompt assembly.
//!
//! [`PromptAssembler`] turns a parsed [`RelayRequest`] into a
//! [`PromptPayload`], applying each mode's input policy on the way.  It is
//! pure: no I/O, no shared state.
//!
//! # Agent cache layout
//!
//! ```text
//! system[0]  AGENT_KNOWLEDGE            cache breakpoint (same for every call)
//! system[1]  <patient_context>…         cache breakpoint (same per patient)
//!            only when needs_patient_data && context is non-blank
//! messages   [summary user, ack assistant]?  + last 8 turns of history
//! ```

use crate::config::{RelayConfig, TokenConfig};
use crate::request::{
    AgentRequest, ChatTurn, InputError, OcrRequest, RelayRequest, Role, StructureRequest,
};

use super::instructions::{
    patient_context_block, structure_user_message, summary_user_message, AGENT_KNOWLEDGE,
    OCR_INSTRUCTION, OCR_USER_INSTRUCTION, STRUCTURE_INSTRUCTION, SUMMARY_ACKNOWLEDGEMENT,
};
use super::payload::{ContentPart, PromptPayload, SystemBlock, Turn, TurnContent};

/// Transcripts are cut to this many characters before assembly.
pub const MAX_TRANSCRIPT_CHARS: usize = 15_000;

/// Fewer non-whitespace characters than this is not a dictation.
pub const MIN_TRANSCRIPT_CHARS: usize = 10;

/// Cap on the base64 image string (~10 MB of binary after the 4/3 inflation).
pub const MAX_IMAGE_CHARS: usize = 14_000_000;

/// Agent history turns forwarded verbatim; older ones are dropped.
pub const AGENT_HISTORY_TURNS: usize = 8;

/// Image types the completion API accepts.
pub const SUPPORTED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

// ---------------------------------------------------------------------------
// PromptAssembler
// ---------------------------------------------------------------------------

/// Builds upstream payloads for all three modes.
///
/// ```rust
/// use dentavoice_relay::config::RelayConfig;
/// use dentavoice_relay::prompt::PromptAssembler;
/// use dentavoice_relay::request::RelayRequest;
///
/// let assembler = PromptAssembler::from_config(&RelayConfig::default());
/// let request = RelayRequest::from_body(br#"{"transcript":"Sharp pain on 36 with cold."}"#).unwrap();
/// let payload = assembler.assemble(request).unwrap();
/// assert_eq!(payload.system().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    model: String,
    tokens: TokenConfig,
}

impl PromptAssembler {
    pub fn new(model: impl Into<String>, tokens: TokenConfig) -> Self {
        Self {
            model: model.into(),
            tokens,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.upstream.model.clone(), config.tokens.clone())
    }

    /// Dispatch to the builder for the request's mode.
    pub fn assemble(&self, request: RelayRequest) -> Result<PromptPayload, InputError> {
        match request {
            RelayRequest::Structure(req) => self.structure(req),
            RelayRequest::Ocr(req) => self.ocr(req),
            RelayRequest::Agent(req) => self.agent(req),
        }
    }

    // -----------------------------------------------------------------------
    // structure
    // -----------------------------------------------------------------------

    /// Trim, length-check and truncate the transcript, then quote it in a
    /// single user turn under the SOAP instruction.
    pub fn structure(&self, request: StructureRequest) -> Result<PromptPayload, InputError> {
        let transcript = request.transcript.unwrap_or_default();
        let trimmed = transcript.trim();

        if trimmed.chars().filter(|c| !c.is_whitespace()).count() < MIN_TRANSCRIPT_CHARS {
            return Err(InputError::TranscriptTooShort);
        }

        let clipped = truncate_chars(trimmed, MAX_TRANSCRIPT_CHARS);
        if clipped.len() < trimmed.len() {
            log::debug!(
                "transcript truncated to {MAX_TRANSCRIPT_CHARS} chars (was {})",
                trimmed.chars().count()
            );
        }

        Ok(PromptPayload::new(
            self.model.clone(),
            self.tokens.structure_max_tokens,
            vec![SystemBlock::cached(STRUCTURE_INSTRUCTION)],
            vec![Turn::text(Role::User, structure_user_message(clipped))],
        ))
    }

    // -----------------------------------------------------------------------
    // ocr
    // -----------------------------------------------------------------------

    /// Image plus a short instruction line under the OCR instruction.
    pub fn ocr(&self, request: OcrRequest) -> Result<PromptPayload, InputError> {
        let media_type = request.media_type().trim().to_ascii_lowercase();
        let image = request
            .image
            .filter(|data| !data.trim().is_empty())
            .ok_or(InputError::MissingImage)?;

        if image.len() > MAX_IMAGE_CHARS {
            return Err(InputError::ImageTooLarge);
        }
        if !SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(InputError::UnsupportedMediaType(media_type));
        }

        let turn = Turn {
            role: Role::User,
            content: TurnContent::Parts(vec![
                ContentPart::Image {
                    media_type,
                    data: image,
                },
                ContentPart::Text(OCR_USER_INSTRUCTION.to_string()),
            ]),
        };

        Ok(PromptPayload::new(
            self.model.clone(),
            self.tokens.ocr_max_tokens,
            vec![SystemBlock::cached(OCR_INSTRUCTION)],
            vec![turn],
        ))
    }

    // -----------------------------------------------------------------------
    // agent
    // -----------------------------------------------------------------------

    /// Two-tier cached system prompt plus compacted history.
    pub fn agent(&self, request: AgentRequest) -> Result<PromptPayload, InputError> {
        if request.messages.is_empty() {
            return Err(InputError::NoMessages);
        }
        // Only turns inside the history window are forwarded, so only they
        // need content.
        let first_kept = request.messages.len().saturating_sub(AGENT_HISTORY_TURNS);
        if let Some(offset) = request.messages[first_kept..]
            .iter()
            .position(|turn| turn.content.trim().is_empty())
        {
            return Err(InputError::EmptyMessage(first_kept + offset));
        }

        let mut system = vec![SystemBlock::cached(AGENT_KNOWLEDGE)];
        let context = request
            .patient_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if request.needs_patient_data {
            if let Some(context) = context {
                system.push(SystemBlock::cached(patient_context_block(context)));
            }
        }

        let max_tokens = if request.needs_patient_data {
            self.tokens.agent_patient_max_tokens
        } else {
            self.tokens.agent_max_tokens
        };

        let summary = request
            .conversation_summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        Ok(PromptPayload::new(
            self.model.clone(),
            max_tokens,
            system,
            compact_history(request.messages, summary),
        ))
    }
}

/// Optional synthetic summary exchange followed by the most recent
/// [`AGENT_HISTORY_TURNS`] turns.
fn compact_history(messages: Vec<ChatTurn>, summary: Option<&str>) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(AGENT_HISTORY_TURNS + 2);

    if let Some(summary) = summary {
        turns.push(Turn::text(Role::User, summary_user_message(summary)));
        turns.push(Turn::text(Role::Assistant, SUMMARY_ACKNOWLEDGEMENT));
    }

    let skip = messages.len().saturating_sub(AGENT_HISTORY_TURNS);
    turns.extend(
        messages
            .into_iter()
            .skip(skip)
            .map(|turn| Turn::text(turn.role, turn.content)),
    );
    turns
}

/// Prefix of `text` holding at most `max` characters, on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
