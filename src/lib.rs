//! DentaVoice relay.
//!
//! Stateless HTTP relay between the DentaVoice browser client and the
//! Anthropic Messages API.  The browser never holds the service credential;
//! the relay injects it, applies per-client rate limiting, assembles the
//! mode-specific prompt and returns a normalized JSON result.
//!
//! | Module        | Role                                              |
//! |---------------|---------------------------------------------------|
//! | [`config`]    | `relay.toml` + environment                        |
//! | [`limiter`]   | fixed-window admission per client identifier      |
//! | [`request`]   | inbound body model and parsing                    |
//! | [`prompt`]    | structure / ocr / agent payload assembly          |
//! | [`upstream`]  | Messages API client and response classification   |
//! | [`normalize`] | upstream text → client JSON contract              |
//! | [`dispatch`]  | per-request state machine and error mapping       |
//! | [`server`]    | axum router, client identity, serve loop          |

pub mod config;
pub mod dispatch;
pub mod limiter;
pub mod normalize;
pub mod prompt;
pub mod request;
pub mod server;
pub mod upstream;
