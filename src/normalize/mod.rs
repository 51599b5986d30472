//! Response normalization.
//!
//! * [`normalize`]: mode-specific parsing of upstream text.
//! * [`schema`]: the client-facing output types and their defaults.

pub mod normalizer;
pub mod schema;

pub use normalizer::{
    normalize, normalize_ocr, normalize_structure, strip_code_fences, NormalizeError,
};
pub use schema::{
    AgentReply, Category, ClinicalNote, ModeResult, NormalizedResponse, NoteSection, OcrResult,
    Priority, Recommendation, StructuredNote, Usage,
};
