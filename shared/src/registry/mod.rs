mod error;

pub use error::RegistryError;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::sync::{ReplicatedProperty, SyncIntent, SyncPacket};
use crate::types::{OwnerId, PeerId, GLOBAL_OWNER};

/// The only place that assigns property ids, and the only place that knows
/// how to turn a wire-level `(property_id, owner_id)` pair back into a live
/// property. Holds weak references only: the registry never keeps a property
/// or its owner alive.
pub struct PropertyRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    next_global_id: u64,
    global: HashMap<u64, Weak<dyn ReplicatedProperty>>,
    owned: HashMap<OwnerId, Vec<Weak<dyn ReplicatedProperty>>>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_global_id: 1,
                global: HashMap::new(),
                owned: HashMap::new(),
            }),
        }
    }

    /// Allocates the next global id and stores the property under it.
    pub fn register_global(&self, property: Weak<dyn ReplicatedProperty>) -> u64 {
        let mut inner = self.inner.lock();
        let id = inner.next_global_id;
        inner.next_global_id += 1;
        inner.global.insert(id, property);
        id
    }

    /// Appends to `owner`'s property list and returns the new position.
    /// Positional ids are only stable while every peer registers an owner's
    /// properties in the same order, since the index is all that identifies
    /// the property on the wire.
    pub fn register_owned(&self, owner: OwnerId, property: Weak<dyn ReplicatedProperty>) -> u32 {
        debug_assert_ne!(owner, GLOBAL_OWNER, "owner id 0 is reserved");
        let mut inner = self.inner.lock();
        let list = inner.owned.entry(owner).or_default();
        list.push(property);
        (list.len() - 1) as u32
    }

    /// Resolves a wire identity to a live property. An owner that no longer
    /// exists (or never replicated to this peer) is `Err`, never a crash:
    /// a stale identity cannot become valid again without a fresh
    /// registration from the authority.
    pub fn resolve(
        &self,
        owner_id: OwnerId,
        property_id: i64,
    ) -> Result<Arc<dyn ReplicatedProperty>, RegistryError> {
        let unknown = RegistryError::UnknownProperty {
            owner_id,
            property_id,
        };

        let inner = self.inner.lock();
        let weak = if owner_id == GLOBAL_OWNER {
            let id = u64::try_from(property_id).map_err(|_| unknown.clone())?;
            inner.global.get(&id).ok_or(unknown.clone())?
        } else {
            let list = inner
                .owned
                .get(&owner_id)
                .ok_or(RegistryError::UnknownOwner { owner_id })?;
            let index = usize::try_from(property_id).map_err(|_| unknown.clone())?;
            list.get(index).ok_or(unknown.clone())?
        };

        weak.upgrade().ok_or(RegistryError::PropertyDropped {
            owner_id,
            property_id,
        })
    }

    /// Removes a global property and stops its traffic.
    pub fn deregister_global(&self, id: u64) {
        let removed = self.inner.lock().global.remove(&id);
        if let Some(property) = removed.and_then(|weak| weak.upgrade()) {
            property.detach();
        }
    }

    /// Drops every property registered under `owner`.
    pub fn owner_destroyed(&self, owner: OwnerId) {
        let Some(list) = self.inner.lock().owned.remove(&owner) else {
            return;
        };
        debug!("owner {} destroyed, detaching {} propert(ies)", owner, list.len());
        for property in list.into_iter().filter_map(|weak| weak.upgrade()) {
            property.detach();
        }
    }

    /// RAII form of the owner-destroyed notification: deregisters `owner`'s
    /// properties when the guard drops.
    pub fn owner_guard(self: &Arc<Self>, owner: OwnerId) -> OwnerGuard {
        OwnerGuard {
            registry: Arc::clone(self),
            owner,
        }
    }

    /// Routing entry point for inbound property traffic.
    pub fn route(
        &self,
        packet: &SyncPacket,
        sender: PeerId,
        timestamp: i64,
    ) -> Result<(), RegistryError> {
        let property = self.resolve(packet.owner_id, packet.property_id)?;

        match packet.intent {
            SyncIntent::Fetch => {
                property.record_message_time(timestamp);
                property.respond_to_fetch(sender);
            }
            _ => {
                let Some(data) = packet.data.as_deref() else {
                    warn!(
                        "sync packet ({}, {}) with intent {:?} carried no data",
                        packet.owner_id, packet.property_id, packet.intent
                    );
                    return Ok(());
                };
                property.apply_network_value(data, sender, timestamp, packet.intent);
            }
        }
        Ok(())
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters an owner's properties on drop.
pub struct OwnerGuard {
    registry: Arc<PropertyRegistry>,
    owner: OwnerId,
}

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        self.registry.owner_destroyed(self.owner);
    }
}
