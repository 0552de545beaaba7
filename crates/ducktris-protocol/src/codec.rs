//! Codec trait and the JSON implementation.
//!
//! The server only talks to a [`Codec`], so the wire format can change
//! without touching request dispatch.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes replies to frame bytes and decodes frame bytes to requests.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into frame bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes frame bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON via `serde_json`.
///
/// ```rust
/// use ducktris_protocol::{Codec, Envelope, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let env: Envelope = codec
///     .decode(br#"{"seq": 1, "request": {"op": "list"}}"#)
///     .unwrap();
/// assert_eq!(env.request, Request::ListRooms);
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
