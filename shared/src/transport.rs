use std::sync::Arc;

use crate::types::{ChannelId, PeerId, Vec3};

/// Where an outbound message should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTarget {
    /// Deliver to the authoritative host.
    Authority,
    /// Deliver to every peer except the local node.
    AllPeers,
    /// Deliver to a single peer.
    Peer(PeerId),
}

/// Handed the raw bytes of every inbound message on a subscribed channel.
pub type ReceiveCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// The physical transport, treated as a black box that moves opaque byte
/// buffers keyed by channel id. Connection setup, peer discovery and delivery
/// guarantees all live behind this seam; the library never owns a socket.
pub trait Transport: Send + Sync {
    fn send(&self, channel: ChannelId, bytes: &[u8], target: SendTarget, reliable: bool);

    /// Subscribes `receiver` to inbound traffic on `channel`. One receiver
    /// per channel; registering again replaces the previous receiver.
    fn register_receiver(&self, channel: ChannelId, receiver: ReceiveCallback);

    /// Stops inbound delivery for `channel`. No-op when nothing is
    /// registered.
    fn unregister_receiver(&self, channel: ChannelId);

    /// Peers whose position lies within `radius` of `origin`. Used to narrow
    /// distance-limited delivery; the spatial query itself is external.
    fn peers_in_range(&self, origin: Vec3, radius: f64) -> Vec<PeerId>;
}

/// Where chat lines and notices are surfaced for a local user.
pub trait ChatDisplay: Send + Sync {
    fn show_message(&self, sender: &str, text: &str);
}
