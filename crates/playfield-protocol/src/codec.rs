//! Codec trait and implementations.
//!
//! The relay and clients only need "something that turns messages into
//! bytes and back". [`JsonCodec`] is readable in browser DevTools, which is
//! what battle clients are debugged with.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// Shared across connection tasks, hence `Send + Sync + 'static`.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// [`ProtocolError::Decode`] if the bytes are malformed or do not match
    /// `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Behind the `json` feature (on by
/// default).
///
/// ```rust
/// use playfield_protocol::{Codec, Envelope, JsonCodec, Payload, SystemMessage};
///
/// let envelope = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     payload: Payload::System(SystemMessage::Heartbeat { client_time: 5000 }),
/// };
///
/// let bytes = JsonCodec.encode(&envelope).unwrap();
/// let decoded: Envelope = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
