mod codec;
mod error;

pub use codec::{decode, encode};
pub use error::EnvelopeError;

use serde::{Deserialize, Serialize};

use crate::types::{now_ticks, PeerId};

/// What the payload of an envelope means to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeKind {
    /// Invocation of a named handler on the far side.
    RemoteCall,
    /// An encoded sync packet for a replicated property.
    PropertySync,
    /// Plain chat/notification text, no dispatch.
    Notification,
}

/// One message unit on the wire. `payload` is only meaningful together with
/// `kind`, and `compressed` means the receiver must reverse compression
/// before interpreting the payload as a sub-structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender_id: PeerId,
    pub kind: EnvelopeKind,
    /// RemoteCall only: the command word plus any space-delimited arguments.
    pub command_name: Option<String>,
    /// RemoteCall only: chat text surfaced on interactive nodes.
    pub display_text: Option<String>,
    pub payload: Option<Vec<u8>>,
    pub timestamp: i64,
    pub compressed: bool,
}

impl Envelope {
    pub fn remote_call(
        sender_id: PeerId,
        command_name: String,
        display_text: Option<String>,
        payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            sender_id,
            kind: EnvelopeKind::RemoteCall,
            command_name: Some(command_name),
            display_text,
            payload,
            timestamp: now_ticks(),
            compressed: false,
        }
    }

    pub fn property_sync(sender_id: PeerId, payload: Vec<u8>) -> Self {
        Self {
            sender_id,
            kind: EnvelopeKind::PropertySync,
            command_name: None,
            display_text: None,
            payload: Some(payload),
            timestamp: now_ticks(),
            compressed: false,
        }
    }

    pub fn notification(sender_id: PeerId, text: String) -> Self {
        Self {
            sender_id,
            kind: EnvelopeKind::Notification,
            command_name: None,
            display_text: Some(text),
            payload: None,
            timestamp: now_ticks(),
            compressed: false,
        }
    }
}
