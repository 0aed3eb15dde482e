mod error;
mod property;

pub use error::SyncError;
pub use property::{NetSync, PositionSource, SyncSettings, SyncValue};

use serde::{Deserialize, Serialize};

use crate::types::{OwnerId, PeerId, GLOBAL_OWNER};

/// The allowed network flow for a property's value. Sends that violate the
/// direction for the local role are suppressed, never surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Only the authority may send; peers are consumers.
    HostToPeer,
    /// Only peers may send; the authority is the consumer.
    PeerToHost,
    /// Either side may send; the authority relays applied updates.
    Bidirectional,
}

/// Delivery mode requested for one outbound sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncIntent {
    /// Deliver to everyone; the authority also relays inbound broadcasts.
    Broadcast,
    /// Targeted delivery to one recipient, never relayed.
    Post,
    /// Ask the other side for its current value; carries no data.
    Fetch,
    /// Set locally only, never transmitted.
    None,
}

/// Payload carried inside a `PropertySync` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPacket {
    pub property_id: i64,
    /// `GLOBAL_OWNER` for registry-global properties.
    pub owner_id: OwnerId,
    /// Absent when `intent` is `Fetch`; the responder reconstructs the
    /// current value and replies with `Post`.
    pub data: Option<Vec<u8>>,
    pub intent: SyncIntent,
}

/// Stable identity of a property for the lifetime of its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// Allocated from the registry-wide counter.
    Global(u64),
    /// Position of the property in its owner's registration list. Only
    /// stable while registration order is deterministic across peers.
    Owned { owner: OwnerId, index: u32 },
}

impl PropertyId {
    /// The `(property_id, owner_id)` pair sent on the wire.
    pub fn to_wire(&self) -> (i64, OwnerId) {
        match *self {
            PropertyId::Global(id) => (id as i64, GLOBAL_OWNER),
            PropertyId::Owned { owner, index } => (i64::from(index), owner),
        }
    }
}

/// Object-safe surface the registry and router use to reach a typed property.
pub trait ReplicatedProperty: Send + Sync {
    fn id(&self) -> PropertyId;

    /// Applies a value received from the network. Deserialization failure
    /// leaves local state unchanged. `intent` decides relay eligibility:
    /// only `Broadcast` traffic fans back out through the authority.
    fn apply_network_value(&self, data: &[u8], sender: PeerId, timestamp: i64, intent: SyncIntent);

    /// Answers a `Fetch` by posting the current value back to the requester.
    fn respond_to_fetch(&self, requester: PeerId);

    fn record_message_time(&self, timestamp: i64);

    /// Stops all network traffic for this property. Terminal.
    fn detach(&self);
}
