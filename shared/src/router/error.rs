use thiserror::Error;

use crate::envelope::EnvelopeError;
use crate::registry::RegistryError;

/// Registration-time usage errors, surfaced to the caller as hard failures
/// since they indicate a programming mistake rather than a runtime condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A remote-call handler is already registered under this name
    #[error("Failed to add the remote call '{name}'. A command with the same name was already added")]
    DuplicateCommand { name: String },

    /// A chat trigger is already registered under this token
    #[error("Failed to add the chat trigger '{token}'. A trigger with the same token was already added")]
    DuplicateChatTrigger { token: String },
}

/// Per-message errors confined to the dispatch boundary; logged and dropped,
/// never propagated to the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A property-sync envelope arrived without a payload
    #[error("Property sync envelope carried no payload")]
    MissingPayload,

    /// A property-sync payload could not be parsed
    #[error("Failed to parse sync packet from envelope payload")]
    MalformedSyncPacket,
}
