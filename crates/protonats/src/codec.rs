use crate::error::{Error, Result};

use std::error::Error as StdError;

use bytes::Bytes;
use tracing::warn;

/// Encodes a payload, reporting failures as [`Error::Marshalling`].
pub fn encode<T, E>(value: T) -> Result<Bytes>
where
    T: TryInto<Bytes, Error = E>,
    E: StdError + Send + Sync + 'static,
{
    value.try_into().map_err(|e| {
        warn!(error = %e, "failed to marshal payload");
        Error::Marshalling(Box::new(e))
    })
}

/// Decodes a payload, reporting failures as [`Error::Unmarshalling`].
pub fn decode<T, E>(bytes: Bytes) -> Result<T>
where
    T: TryFrom<Bytes, Error = E>,
    E: StdError + Send + Sync + 'static,
{
    T::try_from(bytes).map_err(|e| {
        warn!(error = %e, "failed to unmarshal payload");
        Error::Unmarshalling(Box::new(e))
    })
}
