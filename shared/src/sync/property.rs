use std::any::type_name;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, error, info, trace};
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};

use super::{PropertyId, ReplicatedProperty, SyncError, SyncIntent, SyncPacket, TransferDirection};
use crate::constants::DEFAULT_SYNC_DISTANCE;
use crate::router::CommandRouter;
use crate::types::{NodeRole, OwnerId, PeerId, Vec3};

/// Bound required of a replicated value: serde-serializable, cloneable and
/// shareable across the threads that mutate and dispatch it.
pub trait SyncValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> SyncValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Supplies the owner's current position for distance-limited delivery.
pub type PositionSource = Arc<dyn Fn() -> Vec3 + Send + Sync>;

/// Construction-time options for a replicated property.
#[derive(Clone)]
pub struct SyncSettings {
    /// Issue one fetch when the property goes live, so a late joiner pulls
    /// current state instead of waiting for the next organic change.
    pub sync_on_attach: bool,
    /// Narrow outbound delivery to peers near the owner. Has no effect
    /// without a position source.
    pub distance_limited: bool,
    /// Where the owner currently is.
    pub position: Option<PositionSource>,
    /// Radius for distance limiting; the world sync distance when unset.
    pub radius: Option<f64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_on_attach: true,
            distance_limited: true,
            position: None,
            radius: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Registered, but the session is still loading; outbound sync is
    /// suppressed while values may already be set locally.
    Attached,
    /// Fully participating in sync traffic.
    Live,
    /// Owner destroyed; no further traffic in or out. Terminal.
    Detached,
}

// Arc so invocation never holds the lock: a running callback may register
// its own replacement without deadlocking on the write side.
struct Callbacks<T> {
    on_change: Option<Arc<dyn Fn(&T, &T) + Send + Sync>>,
    on_network_change: Option<Arc<dyn Fn(&T, &T, PeerId) + Send + Sync>>,
    before_fetch_response: Option<Arc<dyn Fn(PeerId) + Send + Sync>>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            on_change: None,
            on_network_change: None,
            before_fetch_response: None,
        }
    }
}

/// A typed value kept consistent across peers. Created against a router,
/// registered into the property registry at construction, and deregistered
/// when its owner signals destruction.
pub struct NetSync<T: SyncValue> {
    id: PropertyId,
    direction: TransferDirection,
    settings: SyncSettings,
    value: RwLock<T>,
    lifecycle: Mutex<Lifecycle>,
    last_message_time: AtomicI64,
    callbacks: RwLock<Callbacks<T>>,
    router: Arc<CommandRouter>,
}

impl<T: SyncValue> NetSync<T> {
    /// Creates a registry-global property. Its id comes from the registry's
    /// monotonic counter, so hosts and peers must create global properties
    /// in the same order.
    pub fn new_global(
        router: &Arc<CommandRouter>,
        direction: TransferDirection,
        starting_value: T,
        settings: SyncSettings,
    ) -> Arc<Self> {
        Self::attach(router, None, direction, starting_value, settings)
    }

    /// Creates a property owned by `owner`. Its id is its position in the
    /// owner's registration list, so an owner's properties must be created
    /// in the same order on every peer.
    pub fn new_owned(
        router: &Arc<CommandRouter>,
        owner: OwnerId,
        direction: TransferDirection,
        starting_value: T,
        settings: SyncSettings,
    ) -> Arc<Self> {
        Self::attach(router, Some(owner), direction, starting_value, settings)
    }

    fn attach(
        router: &Arc<CommandRouter>,
        owner: Option<OwnerId>,
        direction: TransferDirection,
        starting_value: T,
        settings: SyncSettings,
    ) -> Arc<Self> {
        let registry = router.registry();

        let property = Arc::new_cyclic(|weak: &Weak<Self>| {
            let handle = weak.clone() as Weak<dyn ReplicatedProperty>;
            let id = match owner {
                None => PropertyId::Global(registry.register_global(handle)),
                Some(owner) => PropertyId::Owned {
                    owner,
                    index: registry.register_owned(owner, handle),
                },
            };
            Self {
                id,
                direction,
                settings,
                value: RwLock::new(starting_value),
                lifecycle: Mutex::new(Lifecycle::Attached),
                last_message_time: AtomicI64::new(0),
                callbacks: RwLock::new(Callbacks::default()),
                router: Arc::clone(router),
            }
        });

        info!(
            "property created: {}, direction: {:?}, sync_on_attach: {}",
            property.descriptor(),
            direction,
            property.settings.sync_on_attach
        );

        let weak = Arc::downgrade(&property);
        router.readiness().when_ready(move || {
            if let Some(property) = weak.upgrade() {
                property.go_live();
            }
        });

        property
    }

    fn go_live(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle != Lifecycle::Attached {
                return;
            }
            *lifecycle = Lifecycle::Live;
        }

        if self.settings.sync_on_attach && !self.router.role().is_authority() {
            self.fetch();
        }
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    /// Ticks of the last recorded network traffic for this property.
    pub fn last_message_time(&self) -> i64 {
        self.last_message_time.load(Ordering::Acquire)
    }

    /// Returns a copy of the last fully-written value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Fires each time the value changes, with (old, new).
    pub fn on_change(&self, callback: impl Fn(&T, &T) + Send + Sync + 'static) {
        self.callbacks.write().on_change = Some(Arc::new(callback));
    }

    /// Fires only when the network changed the value, with (old, new,
    /// originating peer). Lets downstream code tell "I changed this" from
    /// "the network changed this" without re-broadcasting in a loop.
    pub fn on_network_change(&self, callback: impl Fn(&T, &T, PeerId) + Send + Sync + 'static) {
        self.callbacks.write().on_network_change = Some(Arc::new(callback));
    }

    /// Runs just before a fetch request is answered, allowing the value to
    /// be refreshed for the requesting peer.
    pub fn before_fetch_response(&self, callback: impl Fn(PeerId) + Send + Sync + 'static) {
        self.callbacks.write().before_fetch_response = Some(Arc::new(callback));
    }

    /// Writes a new value and, when `intent` asks for it and the transfer
    /// direction permits this role to send, syncs it out.
    pub fn set(&self, new_value: T, intent: SyncIntent) {
        let old_value = {
            let mut value = self.value.write();
            std::mem::replace(&mut *value, new_value.clone())
        };

        self.send_value(intent, None);

        let on_change = self.callbacks.read().on_change.clone();
        if let Some(on_change) = on_change {
            on_change(&old_value, &new_value);
        }
    }

    /// Requests the authoritative value from the other side. Always
    /// permitted for non-authorities; a logged no-op on the authority.
    pub fn fetch(&self) {
        self.send_value(SyncIntent::Fetch, None);
    }

    /// Forces an outbound broadcast of the current value, whether or not it
    /// changed. Used for explicit resync.
    pub fn push(&self) {
        self.send_value(SyncIntent::Broadcast, None);
    }

    /// Forces the current value out to a single recipient.
    pub fn push_to(&self, peer: PeerId) {
        self.send_value(SyncIntent::Post, Some(peer));
    }

    fn is_live(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::Live
    }

    fn direction_permits_send(&self, role: NodeRole) -> bool {
        match self.direction {
            TransferDirection::HostToPeer => role.is_authority(),
            TransferDirection::PeerToHost => !role.is_authority(),
            TransferDirection::Bidirectional => true,
        }
    }

    fn delivery_area(&self) -> Option<(Vec3, f64)> {
        if !self.settings.distance_limited {
            return None;
        }
        let position = self.settings.position.as_ref()?;
        Some((position(), self.settings.radius.unwrap_or(DEFAULT_SYNC_DISTANCE)))
    }

    fn send_value(&self, intent: SyncIntent, target: Option<PeerId>) {
        if intent == SyncIntent::None {
            return;
        }

        if !self.is_live() {
            debug!("{} not live, sync suppressed", self.descriptor());
            return;
        }

        let role = self.router.role();

        if intent == SyncIntent::Fetch {
            // authorities own the data, they do not pull it
            if role.is_authority() {
                debug!("{} fetch ignored on authority", self.descriptor());
                return;
            }
        } else if !self.direction_permits_send(role) {
            debug!(
                "{} send suppressed, transfer direction is {:?}",
                self.descriptor(),
                self.direction
            );
            return;
        }

        let data = if intent == SyncIntent::Fetch {
            None
        } else {
            match bincode::serialize(&*self.value.read()) {
                Ok(bytes) => Some(bytes),
                Err(_) => {
                    error!(
                        "{}",
                        SyncError::Serialization {
                            descriptor: self.descriptor(),
                        }
                    );
                    return;
                }
            }
        };

        let (property_id, owner_id) = self.id.to_wire();
        let packet = SyncPacket {
            property_id,
            owner_id,
            data,
            intent,
        };

        trace!("transmitting {} intent: {:?}", self.descriptor(), intent);
        self.router
            .send_property_sync(&packet, target, self.delivery_area());
    }

    /// Identifier for logging readability.
    pub fn descriptor(&self) -> String {
        match self.id {
            PropertyId::Global(id) => format!("<global//{}.{}>", type_name::<T>(), id),
            PropertyId::Owned { owner, index } => {
                format!("<owner {}//{}.{}>", owner, type_name::<T>(), index)
            }
        }
    }
}

impl<T: SyncValue> ReplicatedProperty for NetSync<T> {
    fn id(&self) -> PropertyId {
        self.id
    }

    fn apply_network_value(&self, data: &[u8], sender: PeerId, timestamp: i64, intent: SyncIntent) {
        if *self.lifecycle.lock() == Lifecycle::Detached {
            debug!("{} detached, inbound value dropped", self.descriptor());
            return;
        }

        let new_value: T = match bincode::deserialize(data) {
            Ok(value) => value,
            Err(_) => {
                error!(
                    "{}",
                    SyncError::Deserialization {
                        descriptor: self.descriptor(),
                        byte_count: data.len(),
                    }
                );
                return;
            }
        };

        let old_value = {
            let mut value = self.value.write();
            std::mem::replace(&mut *value, new_value.clone())
        };
        self.last_message_time.store(timestamp, Ordering::Release);
        trace!("{} applied network value from {}", self.descriptor(), sender);

        // the authority is the hub: fan an applied broadcast back out to the
        // other peers. Posts already reached their one recipient, and only a
        // Bidirectional direction makes peers consumers of peer-born data.
        if intent == SyncIntent::Broadcast
            && self.router.role().is_authority()
            && self.direction == TransferDirection::Bidirectional
        {
            self.send_value(SyncIntent::Broadcast, None);
        }

        let (on_change, on_network_change) = {
            let callbacks = self.callbacks.read();
            (
                callbacks.on_change.clone(),
                callbacks.on_network_change.clone(),
            )
        };
        if let Some(on_change) = on_change {
            on_change(&old_value, &new_value);
        }
        if let Some(on_network_change) = on_network_change {
            on_network_change(&old_value, &new_value, sender);
        }
    }

    fn respond_to_fetch(&self, requester: PeerId) {
        let before_fetch_response = self.callbacks.read().before_fetch_response.clone();
        if let Some(before_fetch_response) = before_fetch_response {
            before_fetch_response(requester);
        }
        self.send_value(SyncIntent::Post, Some(requester));
    }

    fn record_message_time(&self, timestamp: i64) {
        self.last_message_time.store(timestamp, Ordering::Release);
    }

    fn detach(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if *lifecycle == Lifecycle::Detached {
            return;
        }
        *lifecycle = Lifecycle::Detached;
        debug!("{} detached", self.descriptor());
    }
}
