//! Error model for request/response over NATS.
//!
//! Requesters receive [`ServiceError`]s decoded from error-flagged replies.
//! Responders build [`ServerError`]s, optionally wrapping a local cause and
//! attaching headers, and emit them as the reply envelope.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Payload marshalling into and out of message bodies.
pub mod codec;

/// Publishing and receiving error envelopes over a NATS client.
pub mod envelope;

mod error;
mod respond_options;
mod server_error;
mod service_error;

pub use envelope::{SERVICE_ERROR_CODE_HEADER, SERVICE_ERROR_HEADER};
pub use error::{BoxError, Error, Result};
pub use respond_options::RespondOptions;
pub use server_error::{Headers, ServerError, new_server_error, wrap_server_error};
pub use service_error::{ServiceError, as_service_error, is_service_error};
