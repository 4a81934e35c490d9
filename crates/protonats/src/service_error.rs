use crate::envelope::{SERVICE_ERROR_CODE_HEADER, SERVICE_ERROR_HEADER};
use crate::error::Error;
use crate::server_error::ServerError;

use std::error::Error as StdError;
use std::iter;

use async_nats::{HeaderMap, Message};
use thiserror::Error;

/// Returned when the service replies with an error instead of the expected message.
///
/// Displays as `"{code}: {description}"`, followed by `" ({details})"` when
/// details are present.
#[derive(Clone, Debug, Default, Eq, Error, Hash, PartialEq)]
#[error("{code}: {description}{}", details_suffix(.details))]
pub struct ServiceError {
    code: String,
    description: String,
    details: String,
}

fn details_suffix(details: &str) -> String {
    if details.is_empty() {
        String::new()
    } else {
        format!(" ({details})")
    }
}

impl ServiceError {
    /// Creates a service error without details.
    #[must_use]
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_details(code, description, String::new())
    }

    /// Creates a service error with extended details. Empty details count as absent.
    #[must_use]
    pub fn with_details(
        code: impl Into<String>,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            details: details.into(),
        }
    }

    /// Recognises an error-flagged reply from its headers and payload.
    ///
    /// A reply is error-flagged when it carries [`SERVICE_ERROR_CODE_HEADER`].
    /// The description is read from [`SERVICE_ERROR_HEADER`] and a non-empty
    /// payload becomes the details.
    #[must_use]
    pub fn from_headers(headers: Option<&HeaderMap>, payload: &[u8]) -> Option<Self> {
        let headers = headers?;
        let code = headers.get(SERVICE_ERROR_CODE_HEADER)?.to_string();
        let description = headers
            .get(SERVICE_ERROR_HEADER)
            .map(ToString::to_string)
            .unwrap_or_default();
        let details = String::from_utf8_lossy(payload).into_owned();

        Some(Self {
            code,
            description,
            details,
        })
    }

    /// Recognises an error-flagged reply message.
    #[must_use]
    pub fn from_message(message: &Message) -> Option<Self> {
        Self::from_headers(message.headers.as_ref(), &message.payload)
    }

    /// The service-defined error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Extended details, empty when absent.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// The display text of this error.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Whether `candidate` is (or wraps) a service error of any code.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn matches(&self, candidate: &(dyn StdError + 'static)) -> bool {
        is_service_error(candidate)
    }
}

/// Whether `err`, or any error in its source chain, is a [`ServiceError`].
///
/// A [`ServerError`] is never a service error, whatever its cause.
#[must_use]
pub fn is_service_error(err: &(dyn StdError + 'static)) -> bool {
    find_service_error(err).is_some()
}

/// Extracts the first [`ServiceError`] found in the source chain of `err`.
#[must_use]
pub fn as_service_error(err: &(dyn StdError + 'static)) -> Option<ServiceError> {
    find_service_error(err).cloned()
}

// The walk never descends into a ServerError.
fn find_service_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ServiceError> {
    iter::successors(Some(err), |&link| link.source())
        .take_while(|link| !link.is::<ServerError>())
        .find_map(|link| {
            link.downcast_ref::<ServiceError>()
                .or_else(|| link.downcast_ref::<Error>().and_then(Error::service_error))
        })
}
