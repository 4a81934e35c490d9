use crate::envelope::{SERVICE_ERROR_CODE_HEADER, SERVICE_ERROR_HEADER};
use crate::error::BoxError;
use crate::respond_options::{RespondOptions, header_text};

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_nats::HeaderMap;
use bytes::Bytes;

/// Outgoing transport headers: values accumulate per name in insertion order.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Returned from a service implementation when it cannot produce a response.
///
/// Carries a code and description for the reply envelope, an optional
/// wrapped cause, and headers to attach to the reply. Headers are
/// copy-on-write: a clone never observes header changes made to another
/// value.
#[derive(Clone, Debug)]
pub struct ServerError {
    code: String,
    description: String,
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
    headers: Option<Arc<Headers>>,
}

impl ServerError {
    /// Creates a server error without a cause.
    #[must_use]
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::from_parts(None, code, description)
    }

    /// Creates a server error wrapping `cause`.
    #[must_use]
    pub fn wrap(
        cause: impl Into<BoxError>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::from_parts(Some(cause.into()), code, description)
    }

    /// Creates a server error with an optional cause.
    #[must_use]
    pub fn from_parts(
        cause: Option<BoxError>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            cause: cause.map(Arc::from),
            headers: None,
        }
    }

    /// The error code sent to the requester.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The description sent to the requester.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// The display text: the description, followed by `": {cause}"` when wrapped.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Returns the cause text as bytes, or `None` without a cause.
    ///
    /// Suitable as the body of the error reply.
    #[must_use]
    pub fn wrapped_bytes(&self) -> Option<Bytes> {
        self.cause
            .as_ref()
            .map(|cause| Bytes::from(cause.to_string()))
    }

    fn headers_mut(&mut self) -> &mut Headers {
        Arc::make_mut(self.headers.get_or_insert_with(Arc::default))
    }

    /// Appends `value` to the values of header `name`.
    #[must_use]
    pub fn add_header_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers_mut()
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Replaces the values of header `name` with `value`.
    #[must_use]
    pub fn set_header_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers_mut().insert(name.into(), vec![value.into()]);
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(Arc::new(headers));
        self
    }

    /// A snapshot of the current headers.
    #[must_use]
    pub fn headers(&self) -> Headers {
        self.headers.as_deref().cloned().unwrap_or_default()
    }

    /// The values of header `name`, empty if unset.
    #[must_use]
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .as_deref()
            .and_then(|headers| headers.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Decorator applying this error's headers to an outgoing message.
    #[must_use]
    pub fn respond_options(&self) -> RespondOptions {
        RespondOptions::new(self.headers.clone())
    }

    /// The complete header map of the error reply.
    ///
    /// CR and LF in the code, description or header values are sent as spaces.
    #[must_use]
    pub fn response_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SERVICE_ERROR_CODE_HEADER, header_text(&self.code).as_ref());
        headers.insert(SERVICE_ERROR_HEADER, header_text(&self.description).as_ref());
        self.respond_options().merge_into(&mut headers);
        headers
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {cause}", self.description),
            None => f.write_str(&self.description),
        }
    }
}

impl StdError for ServerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Creates a [`ServerError`] to return from a service implementation.
#[must_use]
pub fn new_server_error(code: impl Into<String>, description: impl Into<String>) -> ServerError {
    ServerError::new(code, description)
}

/// Wraps `cause` into a [`ServerError`]. A `None` cause is equivalent to
/// [`new_server_error`].
#[must_use]
pub fn wrap_server_error<E>(
    cause: Option<E>,
    code: impl Into<String>,
    description: impl Into<String>,
) -> ServerError
where
    E: Into<BoxError>,
{
    ServerError::from_parts(cause.map(Into::into), code, description)
}
