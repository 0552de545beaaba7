//! Error types for the protocol layer.

/// Errors raised while turning frames into requests and replies into
/// frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a reply failed. Surfaced to the client as a 500.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame was not a valid request envelope. Surfaced as a 400.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
