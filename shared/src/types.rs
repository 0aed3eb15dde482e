use std::sync::OnceLock;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Identifies a connected peer. `0` doubles as "no specific peer": as a
/// sender it marks traffic from the authority acting as broadcaster, and the
/// role adapters use it as the authority's own id.
pub type PeerId = u64;

/// Identifies the application object a property is attached to.
pub type OwnerId = u64;

/// Reserved owner id selecting the registry-global index.
pub const GLOBAL_OWNER: OwnerId = 0;

/// The logical channel a router listens on.
pub type ChannelId = u16;

/// The part this node plays in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Authority without a local user attached (no chat surface).
    Dedicated,
    /// Authority with a local user (listen host).
    Host,
    /// Non-authoritative participant.
    Peer,
}

impl NodeRole {
    /// Whether this node's writes are canonical.
    pub fn is_authority(&self) -> bool {
        matches!(self, NodeRole::Dedicated | NodeRole::Host)
    }

    /// Whether chat text may be surfaced to a local user.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, NodeRole::Dedicated)
    }
}

/// World position, used to narrow distance-limited delivery.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// Monotonic ticks (milliseconds since first use) stamped on outbound
/// envelopes. Never goes backwards and never returns 0; 0 is reserved for
/// "no traffic recorded". Receiver-opaque: ticks are only ever compared
/// against other ticks from the same sender.
pub fn now_ticks() -> i64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    start.elapsed().as_millis() as i64 + 1
}
