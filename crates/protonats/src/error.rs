use std::error::Error as StdError;

use thiserror::Error;

use crate::service_error::ServiceError;

/// A boxed, thread-safe error used for causes and codec failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias defaulting to the crate [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while exchanging requests and responses.
#[derive(Debug, Error)]
pub enum Error {
    /// Payload could not be encoded.
    #[error("failed to marshal message")]
    Marshalling(#[source] BoxError),

    /// Payload could not be decoded.
    #[error("failed to unmarshal message")]
    Unmarshalling(#[source] BoxError),

    /// Publishing the response failed.
    #[error("failed to publish: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// The request did not produce a reply.
    #[error("request failed: {0}")]
    Request(#[from] async_nats::RequestError),

    /// The service replied with an error.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl Error {
    /// Whether the remote service replied with a structured error.
    #[must_use]
    pub const fn is_service_error(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// The service error carried by this error, if any.
    #[must_use]
    pub const fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(service_error) => Some(service_error),
            _ => None,
        }
    }
}
