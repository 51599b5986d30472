//! Request dispatch.
//!
//! * [`Dispatcher`]: method → preflight → rate limit → credential → parse →
//!   assemble → upstream → normalize.
//! * [`RelayError`]: every failure terminal with its HTTP status.
//! * [`Outcome`]: preflight and success terminals.

pub mod error;
pub mod handler;
pub mod response;

pub use error::{ErrorBody, RelayError};
pub use handler::Dispatcher;
pub use response::Outcome;
