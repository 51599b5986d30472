//! Inbound request model and parsing.
//!
//! * [`RelayRequest`]: parsed body, one variant per [`Mode`].
//! * [`InputError`]: caller-input defects (HTTP 400).

pub mod error;
pub mod parse;
pub mod types;

pub use error::InputError;
pub use types::{AgentRequest, ChatTurn, Mode, OcrRequest, RelayRequest, Role, StructureRequest};
