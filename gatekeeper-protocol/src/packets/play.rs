use std::io::{self, Read, Write};

use gatekeeper_utils::serial::{read_varint_prefixed_string, write_varint_prefixed_string};

use crate::{ConnectionState, Direction, Packet, PacketId};

/// `Play, Clientbound, 0x40`: disconnect during play, JSON reason text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayDisconnect {
    /// JSON-encoded chat component, e.g. `{"text":"..."}`.
    pub json_reason: String,
}

impl Packet for PlayDisconnect {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Play, Direction::Clientbound, 0x40)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.json_reason = read_varint_prefixed_string(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.json_reason)
    }
}

impl PlayDisconnect {
    /// The canonical internal-error disconnect reason sent on any fatal
    /// session error once the session has reached Play.
    #[must_use]
    pub fn internal_proxy_error() -> Self {
        Self { json_reason: r#"{"text":"Internal proxy error"}"#.to_owned() }
    }
}

/// `Play, Serverbound, 0x01`: a chat message typed by the connecting player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessageServerbound {
    /// The raw text the player typed.
    pub message: String,
}

impl Packet for ChatMessageServerbound {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Play, Direction::Serverbound, 0x01)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.message = read_varint_prefixed_string(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.message)
    }
}

/// `Play, Clientbound, 0x02`: a chat message rendered in the client's chat box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessageClientbound {
    /// JSON-encoded chat component.
    pub json_data: String,
}

impl Packet for ChatMessageClientbound {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Play, Direction::Clientbound, 0x02)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.json_data = read_varint_prefixed_string(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.json_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_disconnect_round_trips() {
        let packet = PlayDisconnect { json_reason: r#"{"text":"bye"}"#.to_owned() };
        let mut buf = Vec::new();
        packet.write_body(&mut buf).unwrap();
        let mut decoded = PlayDisconnect::default();
        let mut cursor = &buf[..];
        decoded.read_body(&mut cursor).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn chat_messages_round_trip() {
        let serverbound = ChatMessageServerbound { message: "/greet".to_owned() };
        let mut buf = Vec::new();
        serverbound.write_body(&mut buf).unwrap();
        let mut decoded = ChatMessageServerbound::default();
        let mut cursor = &buf[..];
        decoded.read_body(&mut cursor).unwrap();
        assert_eq!(decoded, serverbound);

        let clientbound = ChatMessageClientbound {
            json_data: r#"{"text":"Hello from the proxy!","color":"red"}"#.to_owned(),
        };
        let mut buf = Vec::new();
        clientbound.write_body(&mut buf).unwrap();
        let mut decoded = ChatMessageClientbound::default();
        let mut cursor = &buf[..];
        decoded.read_body(&mut cursor).unwrap();
        assert_eq!(decoded, clientbound);
    }

    #[test]
    fn chat_ids_differ_by_direction() {
        assert_eq!(ChatMessageServerbound::id().direction, Direction::Serverbound);
        assert_eq!(ChatMessageClientbound::id().direction, Direction::Clientbound);
        assert_eq!(ChatMessageServerbound::id().state, ConnectionState::Play);
    }
}
