//! This binary's own handler set. A deployment embedding `gatekeeper-session`
//! directly would register its own handlers the same way instead of using
//! this module.

use gatekeeper_protocol::packets::{ChatMessageClientbound, ChatMessageServerbound};
use gatekeeper_session::PacketRegistry;

/// Registers the demo `/greet` chat command: a player typing `/greet` never
/// reaches the upstream server, and instead gets a reply rendered straight
/// from the proxy.
pub fn register(registry: &mut PacketRegistry) {
    registry.register::<ChatMessageServerbound, _>(|session, packet| {
        if packet.message.trim() != "/greet" {
            return true;
        }

        let reply = ChatMessageClientbound { json_data: r#"{"text":"Hello from the proxy!","color":"red"}"#.to_owned() };
        if let Err(error) = session.send(&reply) {
            log::warn!("failed to send /greet reply: {error}");
        }

        false
    });
}
