use log::trace;

use super::{Envelope, EnvelopeError};
use crate::constants::COMPRESSION_THRESHOLD_BYTES;

const COMPRESSION_LEVEL: i32 = 3;

/// Serializes an envelope for the transport, compressing its payload first
/// when it exceeds the compression threshold. Does not fail for well-formed
/// envelopes.
pub fn encode(mut envelope: Envelope) -> Result<Vec<u8>, EnvelopeError> {
    if let Some(payload) = &envelope.payload {
        if payload.len() > COMPRESSION_THRESHOLD_BYTES {
            let packed = zstd::stream::encode_all(payload.as_slice(), COMPRESSION_LEVEL)
                .map_err(|_| EnvelopeError::Compression {
                    payload_size: payload.len(),
                })?;
            trace!(
                "compressed envelope payload: {} -> {} bytes",
                payload.len(),
                packed.len()
            );
            envelope.payload = Some(packed);
            envelope.compressed = true;
        }
    }

    bincode::serialize(&envelope).map_err(|_| EnvelopeError::Encode)
}

/// Parses bytes received from the transport back into an envelope, reversing
/// payload compression so the next layer always sees plain payload bytes.
/// Malformed input is a per-message error; callers log and drop.
pub fn decode(bytes: &[u8]) -> Result<Envelope, EnvelopeError> {
    let mut envelope: Envelope =
        bincode::deserialize(bytes).map_err(|_| EnvelopeError::Malformed {
            byte_count: bytes.len(),
        })?;

    if envelope.compressed {
        let packed = envelope.payload.take().ok_or(EnvelopeError::Malformed {
            byte_count: bytes.len(),
        })?;
        let payload = zstd::stream::decode_all(packed.as_slice()).map_err(|_| {
            EnvelopeError::Decompression {
                payload_size: packed.len(),
            }
        })?;
        envelope.payload = Some(payload);
        envelope.compressed = false;
    }

    Ok(envelope)
}
