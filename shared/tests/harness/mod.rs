//! In-memory packet exchange for driving a host and several peers through
//! the router without a real transport. Sends land in a shared queue;
//! [`Exchange::pump`] delivers until the wire is quiet.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use netsync_shared::{
    ChannelId, ChatDisplay, CommandRouter, NodeRole, PeerId, PropertyRegistry, ReadinessGate,
    ReceiveCallback, RouterConfig, SendTarget, Transport, Vec3,
};

pub const TEST_CHANNEL: ChannelId = 12144;
pub const HOST: PeerId = 0;

/// The shared wire: every node's transport pushes here, and every router's
/// registered receiver is reachable from here.
pub struct Hub {
    queue: Mutex<VecDeque<(PeerId, SendTarget, Vec<u8>)>>,
    positions: Mutex<Vec<(PeerId, Vec3)>>,
    receivers: Mutex<HashMap<PeerId, ReceiveCallback>>,
}

impl Hub {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            positions: Mutex::new(Vec::new()),
            receivers: Mutex::new(HashMap::new()),
        })
    }
}

struct HubTransport {
    hub: Arc<Hub>,
    local: PeerId,
}

impl Transport for HubTransport {
    fn send(&self, _channel: ChannelId, bytes: &[u8], target: SendTarget, _reliable: bool) {
        self.hub
            .queue
            .lock()
            .push_back((self.local, target, bytes.to_vec()));
    }

    // one channel per exchange, so receivers are keyed by node
    fn register_receiver(&self, _channel: ChannelId, receiver: ReceiveCallback) {
        self.hub.receivers.lock().insert(self.local, receiver);
    }

    fn unregister_receiver(&self, _channel: ChannelId) {
        self.hub.receivers.lock().remove(&self.local);
    }

    fn peers_in_range(&self, origin: Vec3, radius: f64) -> Vec<PeerId> {
        self.hub
            .positions
            .lock()
            .iter()
            .filter(|(id, position)| {
                *id != self.local && position.distance_squared(&origin) <= radius * radius
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Captures everything surfaced to the local user.
#[derive(Default)]
pub struct RecordingDisplay {
    messages: Mutex<Vec<String>>,
}

impl ChatDisplay for RecordingDisplay {
    fn show_message(&self, _sender: &str, text: &str) {
        self.messages.lock().push(text.to_string());
    }
}

impl RecordingDisplay {
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|text| text == needle)
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One participant: its own router, registry and readiness gate, wired to
/// the shared hub.
pub struct Node {
    pub id: PeerId,
    pub router: Arc<CommandRouter>,
    pub registry: Arc<PropertyRegistry>,
    pub readiness: Arc<ReadinessGate>,
    pub display: Arc<RecordingDisplay>,
}

impl Node {
    fn new(hub: &Arc<Hub>, id: PeerId, role: NodeRole) -> Self {
        let registry = Arc::new(PropertyRegistry::new());
        let readiness = Arc::new(ReadinessGate::new());
        let display = Arc::new(RecordingDisplay::default());
        let transport = Arc::new(HubTransport {
            hub: Arc::clone(hub),
            local: id,
        });
        let router = CommandRouter::new(
            RouterConfig {
                channel: TEST_CHANNEL,
                mod_name: "ExchangeTest".to_string(),
                keyword: Some("test".to_string()),
                role,
                local_peer: id,
            },
            transport,
            display.clone(),
            registry.clone(),
            readiness.clone(),
        );
        Self {
            id,
            router,
            registry,
            readiness,
            display,
        }
    }
}

/// A host plus peers sharing one hub.
pub struct Exchange {
    pub hub: Arc<Hub>,
    pub host: Node,
    pub peers: Vec<Node>,
}

impl Exchange {
    /// Interactive host (a player hosting the session).
    pub fn new(peer_ids: &[PeerId]) -> Self {
        Self::with_host_role(NodeRole::Host, peer_ids)
    }

    pub fn with_host_role(role: NodeRole, peer_ids: &[PeerId]) -> Self {
        let hub = Hub::new();
        let host = Node::new(&hub, HOST, role);
        let peers = peer_ids
            .iter()
            .map(|&id| {
                hub.positions.lock().push((id, Vec3::default()));
                Node::new(&hub, id, NodeRole::Peer)
            })
            .collect();
        Self { hub, host, peers }
    }

    /// Moves a peer for distance-limited delivery checks.
    pub fn place_peer(&self, id: PeerId, position: Vec3) {
        for entry in self.hub.positions.lock().iter_mut() {
            if entry.0 == id {
                entry.1 = position;
            }
        }
    }

    /// Flips every node's readiness gate, which takes attached properties
    /// live (and fires their bootstrap fetches).
    pub fn all_ready(&self) {
        self.host.readiness.signal_ready();
        for peer in &self.peers {
            peer.readiness.signal_ready();
        }
    }

    /// Messages still sitting on the wire.
    pub fn pending(&self) -> usize {
        self.hub.queue.lock().len()
    }

    /// Delivers queued messages through the receivers the routers registered,
    /// until the wire is quiet. Relays produced by a delivery are picked up
    /// on the next loop iteration.
    pub fn pump(&self) {
        loop {
            let Some((from, target, bytes)) = self.hub.queue.lock().pop_front() else {
                return;
            };
            match target {
                SendTarget::Authority => self.deliver(HOST, &bytes),
                SendTarget::Peer(id) => self.deliver(id, &bytes),
                SendTarget::AllPeers => {
                    if from != HOST {
                        self.deliver(HOST, &bytes);
                    }
                    for peer in self.peers.iter().filter(|peer| peer.id != from) {
                        self.deliver(peer.id, &bytes);
                    }
                }
            }
        }
    }

    fn deliver(&self, to: PeerId, bytes: &[u8]) {
        // cloned out so a receiver may touch the hub while running
        let receiver = self.hub.receivers.lock().get(&to).cloned();
        if let Some(receiver) = receiver {
            receiver(bytes);
        }
    }
}
