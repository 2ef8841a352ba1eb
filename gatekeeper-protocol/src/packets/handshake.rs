use std::io::{self, Read, Write};

use gatekeeper_utils::{
    codec::VarInt,
    serial::{read_varint_prefixed_string, write_varint_prefixed_string},
};

use crate::{ConnectionState, Direction, Packet, PacketId};

/// `Handshaking, Serverbound, 0x00`: the first packet on every connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    /// The client's declared protocol version, echoed back, never validated.
    pub protocol_version: i32,
    /// The address the client believes it is connecting to.
    pub server_address: String,
    /// The port the client believes it is connecting to.
    pub server_port: u16,
    /// `1` for Status, `2` for Login; any other value is a fatal protocol error.
    pub next_state: i32,
}

impl Packet for Handshake {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Handshaking, Direction::Serverbound, 0x00)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.protocol_version = VarInt::read_sync(reader)?.0;
        self.server_address = read_varint_prefixed_string(reader)?;
        self.server_port = u16::from_be_bytes({
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            buf
        });
        self.next_state = VarInt::read_sync(reader)?.0;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        VarInt(self.protocol_version).write_sync(writer)?;
        write_varint_prefixed_string(writer, &self.server_address)?;
        writer.write_all(&self.server_port.to_be_bytes())?;
        VarInt(self.next_state).write_sync(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let packet = Handshake {
            protocol_version: 47,
            server_address: "play.example.com".to_owned(),
            server_port: 25565,
            next_state: 2,
        };

        let mut buf = Vec::new();
        packet.write_body(&mut buf).unwrap();

        let mut decoded = Handshake::default();
        let mut cursor = &buf[..];
        decoded.read_body(&mut cursor).unwrap();

        assert_eq!(decoded, packet);
    }
}
