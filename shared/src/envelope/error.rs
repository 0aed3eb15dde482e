use thiserror::Error;

/// Errors that can occur while encoding or decoding wire envelopes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Received bytes could not be parsed into an envelope
    #[error("Failed to parse envelope from {byte_count} received bytes (possible malformed or malicious data)")]
    Malformed { byte_count: usize },

    /// Payload compression failed
    #[error("Failed to compress payload of {payload_size} bytes")]
    Compression { payload_size: usize },

    /// Payload decompression failed
    #[error("Failed to decompress payload of {payload_size} bytes (possible malformed or malicious data)")]
    Decompression { payload_size: usize },

    /// Envelope serialization failed (should never happen for well-formed envelopes)
    #[error("Failed to serialize envelope")]
    Encode,
}
