//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Malformed bytes, missing fields, or an unknown message tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Well-formed, but not allowed by the protocol (wrong version, a seed
    /// outside the generator's range, ...).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
