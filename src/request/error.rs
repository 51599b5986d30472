//! Caller-input errors.
//!
//! Every variant renders as a message the client can show verbatim; all of
//! them map to HTTP 400.

use thiserror::Error;

/// A defect in the caller's request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Body is not parseable JSON.
    #[error("Request body must be valid JSON.")]
    InvalidJson,

    /// Body could not be read off the connection.
    #[error("Request body could not be read.")]
    UnreadableBody,

    /// Body parsed but is not a JSON object.
    #[error("Request body must be a JSON object.")]
    NotAnObject,

    /// `mode` names something other than structure / ocr / agent.
    #[error("Unknown mode \"{0}\". Expected \"structure\", \"ocr\" or \"agent\".")]
    UnknownMode(String),

    /// A field is present but has the wrong shape.
    #[error("Invalid request: {0}")]
    InvalidField(String),

    /// Transcript missing or below the minimum meaningful length.
    #[error("Please provide a longer dictation (at least a few words).")]
    TranscriptTooShort,

    #[error("No image provided.")]
    MissingImage,

    #[error("Image is too large. Please use a smaller image (under 10MB).")]
    ImageTooLarge,

    #[error("Unsupported image type \"{0}\". Use JPEG, PNG, GIF or WebP.")]
    UnsupportedMediaType(String),

    #[error("No messages provided.")]
    NoMessages,

    /// A conversation turn has blank content.
    #[error("Message {0} has no content.")]
    EmptyMessage(usize),
}
