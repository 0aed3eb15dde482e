//! # Netsync Server
//! Authority-role adapter: stands the shared router up as the authoritative
//! host and adds the delivery helpers only the authority needs (targeted,
//! multi-target and radius-limited sends, plain chat broadcast).

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

use std::sync::Arc;

use log::debug;

use netsync_shared::{
    ChannelId, ChatDisplay, CommandRouter, NodeRole, PeerId, PropertyRegistry, ReadinessGate,
    RouterConfig, Transport, Vec3, DEFAULT_SYNC_DISTANCE,
};

/// The authority end of a channel.
pub struct Server {
    router: Arc<CommandRouter>,
}

impl Server {
    /// `interactive` selects between a listen host (chat surfaced locally)
    /// and a dedicated host.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel: ChannelId,
        mod_name: &str,
        keyword: Option<&str>,
        interactive: bool,
        transport: Arc<dyn Transport>,
        display: Arc<dyn ChatDisplay>,
        registry: Arc<PropertyRegistry>,
        readiness: Arc<ReadinessGate>,
    ) -> Self {
        let role = if interactive {
            NodeRole::Host
        } else {
            NodeRole::Dedicated
        };
        let config = RouterConfig {
            channel,
            mod_name: mod_name.to_string(),
            keyword: keyword.map(str::to_string),
            role,
            local_peer: 0,
        };
        Self {
            router: CommandRouter::new(config, transport, display, registry, readiness),
        }
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Sends a command to every peer, or to one when `target` is given.
    pub fn send_command(
        &self,
        command: &str,
        display_text: Option<&str>,
        payload: Option<Vec<u8>>,
        target: Option<PeerId>,
        reliable: bool,
    ) {
        self.router
            .send_remote_call(command, display_text, payload, target, reliable);
    }

    /// Sends the same command to each listed peer.
    pub fn send_command_to_many(
        &self,
        peers: &[PeerId],
        command: &str,
        display_text: Option<&str>,
        payload: Option<Vec<u8>>,
        reliable: bool,
    ) {
        debug!("sending '{}' to {} peer(s)", command, peers.len());
        for peer in peers {
            self.router
                .send_remote_call(command, display_text, payload.clone(), Some(*peer), reliable);
        }
    }

    /// Sends a command only to peers within `radius` of `point`; the world
    /// sync distance when unset.
    pub fn send_command_in_range(
        &self,
        point: Vec3,
        radius: Option<f64>,
        command: &str,
        display_text: Option<&str>,
        payload: Option<Vec<u8>>,
        reliable: bool,
    ) {
        self.router.send_remote_call_in_range(
            command,
            display_text,
            payload,
            point,
            radius.unwrap_or(DEFAULT_SYNC_DISTANCE),
            reliable,
        );
    }

    /// Broadcasts plain chat text to every peer.
    pub fn say(&self, message: &str) {
        self.router.send_notification(message, None, true);
    }
}
