//! Prompt assembly for the three relay modes.
//!
//! * [`PromptAssembler`]: validates mode input and builds the payload.
//! * [`PromptPayload`]: model, token ceiling, system blocks, turns.
//! * [`instructions`]: fixed, cache-eligible instruction texts.

pub mod assembler;
pub mod instructions;
pub mod payload;

pub use assembler::{
    PromptAssembler, AGENT_HISTORY_TURNS, MAX_IMAGE_CHARS, MAX_TRANSCRIPT_CHARS,
    MIN_TRANSCRIPT_CHARS, SUPPORTED_MEDIA_TYPES,
};
pub use payload::{ContentPart, PromptPayload, SystemBlock, Turn, TurnContent};
