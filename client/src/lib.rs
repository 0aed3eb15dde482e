//! # Netsync Client
//! Peer-role adapter: stands the shared router up as a non-authoritative
//! participant. Every outbound message is addressed to the authority; the
//! star topology has no peer-to-peer edges.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

use std::sync::Arc;

use log::debug;

use netsync_shared::{
    ChannelId, ChatDisplay, CommandRouter, NodeRole, PeerId, PropertyRegistry, ReadinessGate,
    RouterConfig, Transport,
};

/// The peer end of a channel.
pub struct Client {
    router: Arc<CommandRouter>,
}

impl Client {
    /// `local_peer` is this participant's transport-assigned identity,
    /// stamped as the sender on everything it transmits.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel: ChannelId,
        mod_name: &str,
        keyword: Option<&str>,
        local_peer: PeerId,
        transport: Arc<dyn Transport>,
        display: Arc<dyn ChatDisplay>,
        registry: Arc<PropertyRegistry>,
        readiness: Arc<ReadinessGate>,
    ) -> Self {
        let config = RouterConfig {
            channel,
            mod_name: mod_name.to_string(),
            keyword: keyword.map(str::to_string),
            role: NodeRole::Peer,
            local_peer,
        };
        Self {
            router: CommandRouter::new(config, transport, display, registry, readiness),
        }
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Sends a command to the authority.
    pub fn send_command(
        &self,
        command: &str,
        display_text: Option<&str>,
        payload: Option<Vec<u8>>,
        reliable: bool,
    ) {
        debug!("sending '{}' to the authority", command);
        self.router
            .send_remote_call(command, display_text, payload, None, reliable);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use netsync_shared::{
        ChannelId, ChatDisplay, PeerId, PropertyRegistry, ReadinessGate, ReceiveCallback,
        SendTarget, Transport, Vec3,
    };

    use super::Client;

    #[derive(Default)]
    struct RecordingTransport {
        sends: Mutex<Vec<(ChannelId, SendTarget, bool)>>,
        receivers: Mutex<Vec<ChannelId>>,
    }

    impl Transport for RecordingTransport {
        fn send(&self, channel: ChannelId, _bytes: &[u8], target: SendTarget, reliable: bool) {
            self.sends.lock().unwrap().push((channel, target, reliable));
        }

        fn register_receiver(&self, channel: ChannelId, _receiver: ReceiveCallback) {
            self.receivers.lock().unwrap().push(channel);
        }

        fn unregister_receiver(&self, channel: ChannelId) {
            self.receivers.lock().unwrap().retain(|open| *open != channel);
        }

        fn peers_in_range(&self, _origin: Vec3, _radius: f64) -> Vec<PeerId> {
            Vec::new()
        }
    }

    struct NullDisplay;

    impl ChatDisplay for NullDisplay {
        fn show_message(&self, _sender: &str, _text: &str) {}
    }

    fn client_on(transport: &Arc<RecordingTransport>) -> Client {
        Client::new(
            9,
            "Test",
            None,
            3,
            transport.clone(),
            Arc::new(NullDisplay),
            Arc::new(PropertyRegistry::new()),
            Arc::new(ReadinessGate::new()),
        )
    }

    #[test]
    fn commands_go_to_the_authority() {
        let transport = Arc::new(RecordingTransport::default());
        let client = client_on(&transport);

        client.send_command("ping", None, None, true);

        let sends = transport.sends.lock().unwrap();
        assert_eq!(sends.as_slice(), [(9, SendTarget::Authority, true)]);
    }

    #[test]
    fn construction_subscribes_and_drop_unsubscribes() {
        let transport = Arc::new(RecordingTransport::default());
        let client = client_on(&transport);
        assert_eq!(transport.receivers.lock().unwrap().as_slice(), [9]);

        drop(client);
        assert!(transport.receivers.lock().unwrap().is_empty());
    }
}
