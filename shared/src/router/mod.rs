mod error;

pub use error::{CommandError, DispatchError};

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use crate::envelope::{self, Envelope, EnvelopeKind};
use crate::readiness::ReadinessGate;
use crate::registry::PropertyRegistry;
use crate::sync::SyncPacket;
use crate::transport::{ChatDisplay, SendTarget, Transport};
use crate::types::{ChannelId, NodeRole, PeerId, Vec3};

/// Callback invoked when a registered command arrives:
/// (sender, full command string, payload, timestamp).
pub type CommandHandler = Arc<dyn Fn(PeerId, &str, Option<&[u8]>, i64) + Send + Sync>;

/// Callback invoked for a recognized chat trigger, with the argument text.
pub type ChatHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Everything needed to stand up a router on one channel. The role is
/// sampled once at startup and threaded through, never re-derived
/// mid-operation.
pub struct RouterConfig {
    pub channel: ChannelId,
    /// Title prefixed to chat messages surfaced locally.
    pub mod_name: String,
    /// Chat lines starting with this word (case-insensitive) are claimed.
    pub keyword: Option<String>,
    pub role: NodeRole,
    pub local_peer: PeerId,
}

/// The single entry/exit point for one logical channel: wraps outbound
/// traffic in envelopes and demultiplexes inbound envelopes into property
/// sync, named remote calls, and chat/notification text.
pub struct CommandRouter {
    channel: ChannelId,
    mod_name: String,
    keyword: Option<String>,
    role: NodeRole,
    local_peer: PeerId,
    transport: Arc<dyn Transport>,
    display: Arc<dyn ChatDisplay>,
    registry: Arc<PropertyRegistry>,
    readiness: Arc<ReadinessGate>,
    commands: Mutex<HashMap<String, CommandHandler>>,
    chat_triggers: Mutex<HashMap<String, ChatHandler>>,
}

impl CommandRouter {
    pub fn new(
        config: RouterConfig,
        transport: Arc<dyn Transport>,
        display: Arc<dyn ChatDisplay>,
        registry: Arc<PropertyRegistry>,
        readiness: Arc<ReadinessGate>,
    ) -> Arc<Self> {
        let keyword = config.keyword.map(|keyword| keyword.to_lowercase());
        info!(
            "router initialized. channel: {} name: {} keyword: {:?} role: {:?}",
            config.channel, config.mod_name, keyword, config.role
        );
        let router = Arc::new(Self {
            channel: config.channel,
            mod_name: config.mod_name,
            keyword,
            role: config.role,
            local_peer: config.local_peer,
            transport,
            display,
            registry,
            readiness,
            commands: Mutex::new(HashMap::new()),
            chat_triggers: Mutex::new(HashMap::new()),
        });

        // weak: the transport must not keep a closed router alive
        let weak = Arc::downgrade(&router);
        router.transport.register_receiver(
            router.channel,
            Arc::new(move |bytes: &[u8]| {
                if let Some(router) = weak.upgrade() {
                    router.dispatch_incoming(bytes);
                }
            }),
        );

        router
    }

    /// Unsubscribes this router from its transport channel; no further
    /// inbound traffic is dispatched. Runs automatically when the last
    /// handle drops.
    pub fn close(&self) {
        debug!("router closed, leaving channel {}", self.channel);
        self.transport.unregister_receiver(self.channel);
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn local_peer(&self) -> PeerId {
        self.local_peer
    }

    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.registry
    }

    pub fn readiness(&self) -> &Arc<ReadinessGate> {
        &self.readiness
    }

    /// Registers `handler` for a command token (case-normalized). The empty
    /// string is the unnamed slot, matched by command-less remote calls.
    pub fn register_remote_call(
        &self,
        name: &str,
        handler: impl Fn(PeerId, &str, Option<&[u8]>, i64) + Send + Sync + 'static,
    ) -> Result<(), CommandError> {
        let name = name.to_lowercase();
        let mut commands = self.commands.lock();
        if commands.contains_key(&name) {
            return Err(CommandError::DuplicateCommand { name });
        }
        commands.insert(name, Arc::new(handler));
        Ok(())
    }

    /// No-op if `name` was never registered.
    pub fn unregister_remote_call(&self, name: &str) {
        self.commands.lock().remove(&name.to_lowercase());
    }

    /// Registers `handler` for a chat trigger token. Same contract as
    /// [`register_remote_call`](Self::register_remote_call), separate
    /// namespace.
    pub fn register_chat_trigger(
        &self,
        token: &str,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Result<(), CommandError> {
        let token = token.to_lowercase();
        let mut chat_triggers = self.chat_triggers.lock();
        if chat_triggers.contains_key(&token) {
            return Err(CommandError::DuplicateChatTrigger { token });
        }
        chat_triggers.insert(token, Arc::new(handler));
        Ok(())
    }

    pub fn unregister_chat_trigger(&self, token: &str) {
        self.chat_triggers.lock().remove(&token.to_lowercase());
    }

    /// Builds a `RemoteCall` envelope and delivers it: to `target` when
    /// given, otherwise to every peer (on the authority) or to the authority
    /// (on a peer). When `display_text` is set and this node is interactive
    /// the text is also surfaced immediately, so the sender sees its own
    /// chat line without a round trip.
    pub fn send_remote_call(
        &self,
        command: &str,
        display_text: Option<&str>,
        payload: Option<Vec<u8>>,
        target: Option<PeerId>,
        reliable: bool,
    ) {
        let envelope = Envelope::remote_call(
            self.local_peer,
            command.to_string(),
            display_text.map(str::to_string),
            payload,
        );
        self.send_envelope(envelope, target, None, reliable);
    }

    /// `RemoteCall` narrowed to peers within `radius` of `origin`.
    pub fn send_remote_call_in_range(
        &self,
        command: &str,
        display_text: Option<&str>,
        payload: Option<Vec<u8>>,
        origin: Vec3,
        radius: f64,
        reliable: bool,
    ) {
        let envelope = Envelope::remote_call(
            self.local_peer,
            command.to_string(),
            display_text.map(str::to_string),
            payload,
        );
        self.send_envelope(envelope, None, Some((origin, radius)), reliable);
    }

    /// Plain chat/notification text; no dispatch on the far side.
    pub fn send_notification(&self, text: &str, target: Option<PeerId>, reliable: bool) {
        let envelope = Envelope::notification(self.local_peer, text.to_string());
        self.send_envelope(envelope, target, None, reliable);
    }

    pub(crate) fn send_property_sync(
        &self,
        packet: &SyncPacket,
        target: Option<PeerId>,
        area: Option<(Vec3, f64)>,
    ) {
        let payload = match bincode::serialize(packet) {
            Ok(payload) => payload,
            Err(_) => {
                error!(
                    "failed to serialize sync packet ({}, {})",
                    packet.owner_id, packet.property_id
                );
                return;
            }
        };
        let envelope = Envelope::property_sync(self.local_peer, payload);
        self.send_envelope(envelope, target, area, true);
    }

    fn send_envelope(
        &self,
        envelope: Envelope,
        target: Option<PeerId>,
        area: Option<(Vec3, f64)>,
        reliable: bool,
    ) {
        if let Some(text) = envelope.display_text.as_deref() {
            if self.role.is_interactive() {
                self.display.show_message(&self.mod_name, text);
            }
        }

        let bytes = match envelope::encode(envelope) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("dropping outbound message: {}", err);
                return;
            }
        };

        trace!("transmitting {} bytes on channel {}", bytes.len(), self.channel);

        // star topology: peers only ever talk to the authority
        if !self.role.is_authority() {
            self.transport
                .send(self.channel, &bytes, SendTarget::Authority, reliable);
            return;
        }

        match (target, area) {
            (Some(peer), _) => {
                self.transport
                    .send(self.channel, &bytes, SendTarget::Peer(peer), reliable);
            }
            (None, Some((origin, radius))) => {
                let peers = self.transport.peers_in_range(origin, radius);
                trace!("delivery narrowed to {} peer(s) within {}", peers.len(), radius);
                for peer in peers {
                    self.transport
                        .send(self.channel, &bytes, SendTarget::Peer(peer), reliable);
                }
            }
            (None, None) => {
                self.transport
                    .send(self.channel, &bytes, SendTarget::AllPeers, reliable);
            }
        }
    }

    /// Feed bytes received from the transport. Never lets one bad message or
    /// one failing handler take down the channel: every error is logged and
    /// confined here.
    pub fn dispatch_incoming(&self, bytes: &[u8]) {
        if let Err(err) = self.try_dispatch(bytes) {
            warn!("dropping message on channel {}: {}", self.channel, err);
        }
    }

    fn try_dispatch(&self, bytes: &[u8]) -> Result<(), DispatchError> {
        let envelope = envelope::decode(bytes)?;
        trace!(
            "received {:?} envelope from {} ({} bytes)",
            envelope.kind,
            envelope.sender_id,
            bytes.len()
        );

        match envelope.kind {
            EnvelopeKind::PropertySync => {
                let payload = envelope
                    .payload
                    .as_deref()
                    .ok_or(DispatchError::MissingPayload)?;
                let packet: SyncPacket = bincode::deserialize(payload)
                    .map_err(|_| DispatchError::MalformedSyncPacket)?;
                self.registry
                    .route(&packet, envelope.sender_id, envelope.timestamp)?;
            }
            EnvelopeKind::RemoteCall => {
                self.surface(envelope.display_text.as_deref());
                self.dispatch_command(&envelope);
            }
            EnvelopeKind::Notification => {
                self.surface(envelope.display_text.as_deref());
            }
        }
        Ok(())
    }

    fn surface(&self, text: Option<&str>) {
        if let Some(text) = text {
            if self.role.is_interactive() {
                self.display.show_message(&self.mod_name, text);
            }
        }
    }

    fn dispatch_command(&self, envelope: &Envelope) {
        let command = envelope.command_name.as_deref().unwrap_or("");
        let token = command
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();

        let handler = self.commands.lock().get(&token).cloned();
        if let Some(handler) = handler {
            handler(
                envelope.sender_id,
                command,
                envelope.payload.as_deref(),
                envelope.timestamp,
            );
        } else if token.is_empty() {
            // unnamed chat-only traffic with no handler registered for it
        } else if self.role.is_interactive() {
            self.display
                .show_message(&self.mod_name, "Command not recognized.");
        } else {
            debug!("unrecognized command token '{}'", token);
        }
    }

    /// Line-of-text entry point. Claims the line (sets `suppress`) when it
    /// starts with the configured keyword, then dispatches the next word as
    /// a chat trigger.
    pub fn handle_chat_input(&self, text: &str, suppress: &mut bool) {
        let Some(keyword) = self.keyword.as_deref() else {
            return;
        };

        let line = text.trim_start();
        let Some(first) = line.split_whitespace().next() else {
            return;
        };
        if !first.eq_ignore_ascii_case(keyword) {
            return;
        }
        *suppress = true;

        // eq_ignore_ascii_case guarantees equal lengths
        let after_keyword = line[first.len()..].trim_start();
        let token = after_keyword.split_whitespace().next().unwrap_or("");
        let arguments = after_keyword[token.len()..].trim();

        let handler = self.chat_triggers.lock().get(&token.to_lowercase()).cloned();
        if let Some(handler) = handler {
            handler(arguments);
        } else if self.role.is_interactive() {
            self.display
                .show_message(&self.mod_name, "Command not recognized.");
        }
    }
}

impl Drop for CommandRouter {
    fn drop(&mut self) {
        self.close();
    }
}
