use crate::codec;
use crate::error::{Error, Result};
use crate::server_error::ServerError;
use crate::service_error::ServiceError;

use std::error::Error as StdError;

use async_nats::{Client, Message};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

/// Header carrying the description of an error reply.
pub const SERVICE_ERROR_HEADER: &str = "Nats-Service-Error";

/// Header carrying the code of an error reply. Its presence flags the reply as an error.
pub const SERVICE_ERROR_CODE_HEADER: &str = "Nats-Service-Error-Code";

/// Publishes `error` as the reply to an inbound request.
///
/// The reply carries the code and description headers, the error's own
/// headers, and the cause text as body (empty without a cause).
///
/// # Errors
///
/// Returns [`Error::Publish`] if the message could not be published.
#[instrument(skip(client, error), fields(code = %error.code()))]
pub async fn respond_error(client: &Client, reply: String, error: &ServerError) -> Result<()> {
    let payload = error.wrapped_bytes().unwrap_or_default();

    debug!(description = %error.description(), "responding with server error");

    client
        .publish_with_headers(reply, error.response_headers(), payload)
        .await?;

    Ok(())
}

/// Sends a request and turns an error-flagged reply into [`Error::Service`].
///
/// # Errors
///
/// Returns [`Error::Request`] on transport failure and [`Error::Service`] when
/// the service replied with an error.
#[instrument(skip(client, payload))]
pub async fn request(client: &Client, subject: String, payload: Bytes) -> Result<Message> {
    let message = client.request(subject, payload).await?;

    if let Some(service_error) = ServiceError::from_message(&message) {
        warn!(
            code = %service_error.code(),
            description = %service_error.description(),
            "service replied with error"
        );
        return Err(Error::Service(service_error));
    }

    Ok(message)
}

/// Sends a typed request and decodes the typed reply.
///
/// # Errors
///
/// Returns [`Error::Marshalling`] or [`Error::Unmarshalling`] when the payloads
/// cannot be converted, otherwise the errors of [`request`].
pub async fn call<T, TS, R, RD>(client: &Client, subject: String, message: T) -> Result<R>
where
    T: TryInto<Bytes, Error = TS>,
    TS: StdError + Send + Sync + 'static,
    R: TryFrom<Bytes, Error = RD>,
    RD: StdError + Send + Sync + 'static,
{
    let payload = codec::encode(message)?;
    let reply = request(client, subject, payload).await?;

    codec::decode(reply.payload)
}
