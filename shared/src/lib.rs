//! # Netsync Shared
//! Common functionality shared between netsync-server & netsync-client crates:
//! the wire envelope codec, the command router, the replicated-property
//! registry and the `NetSync` property type itself.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod constants;
mod envelope;
mod readiness;
mod registry;
mod router;
mod sync;
mod transport;
mod types;

pub use constants::{COMPRESSION_THRESHOLD_BYTES, DEFAULT_SYNC_DISTANCE};
pub use envelope::{decode, encode, Envelope, EnvelopeError, EnvelopeKind};
pub use readiness::ReadinessGate;
pub use registry::{OwnerGuard, PropertyRegistry, RegistryError};
pub use router::{
    ChatHandler, CommandError, CommandHandler, CommandRouter, DispatchError, RouterConfig,
};
pub use sync::{
    NetSync, PositionSource, PropertyId, ReplicatedProperty, SyncError, SyncIntent, SyncPacket,
    SyncSettings, SyncValue, TransferDirection,
};
pub use transport::{ChatDisplay, ReceiveCallback, SendTarget, Transport};
pub use types::{now_ticks, ChannelId, NodeRole, OwnerId, PeerId, Vec3, GLOBAL_OWNER};
