use std::io::{self, Read, Write};

use gatekeeper_utils::serial::{ReadFrom, WriteTo, read_varint_prefixed_string, write_varint_prefixed_string};

use crate::{ConnectionState, Direction, Packet, PacketId};

fn read_u16_prefixed_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = u16::read_from(reader)?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn write_u16_prefixed_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    #[allow(clippy::cast_possible_truncation, reason = "RSA-encrypted login fields never exceed u16::MAX bytes")]
    let len = bytes.len() as u16;
    len.write_to(writer)?;
    writer.write_all(bytes)
}

/// `Login, Clientbound, 0x00`: disconnect during login, JSON reason text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginDisconnect {
    /// JSON-encoded chat component, e.g. `{"text":"..."}`.
    pub json_reason: String,
}

impl Packet for LoginDisconnect {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Login, Direction::Clientbound, 0x00)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.json_reason = read_varint_prefixed_string(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.json_reason)
    }
}

impl LoginDisconnect {
    /// The canonical internal-error disconnect reason sent on any fatal
    /// session error during Login.
    #[must_use]
    pub fn internal_proxy_error() -> Self {
        Self { json_reason: r#"{"text":"Internal proxy error"}"#.to_owned() }
    }
}

/// `Login, Clientbound, 0x01`: the upstream server's RSA encryption challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionRequest {
    /// The upstream's handshake nonce.
    pub server_id: String,
    /// DER `SubjectPublicKeyInfo` of the upstream's RSA public key.
    pub public_key: Vec<u8>,
    /// Random bytes the client (here, this proxy) must echo back encrypted.
    pub verify_token: Vec<u8>,
}

impl Packet for EncryptionRequest {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Login, Direction::Clientbound, 0x01)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.server_id = read_varint_prefixed_string(reader)?;
        self.public_key = read_u16_prefixed_bytes(reader)?;
        self.verify_token = read_u16_prefixed_bytes(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.server_id)?;
        write_u16_prefixed_bytes(writer, &self.public_key)?;
        write_u16_prefixed_bytes(writer, &self.verify_token)
    }
}

/// `Login, Clientbound, 0x02`: the upstream confirms the session is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginSuccess {
    /// The authenticated player UUID, as a string (undashed or dashed — passed through verbatim).
    pub uuid: String,
    /// The authenticated player's username.
    pub username: String,
}

impl Packet for LoginSuccess {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Login, Direction::Clientbound, 0x02)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.uuid = read_varint_prefixed_string(reader)?;
        self.username = read_varint_prefixed_string(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.uuid)?;
        write_varint_prefixed_string(writer, &self.username)
    }
}

/// `Login, Serverbound, 0x00`: the client announces its chosen name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginStart {
    /// The player name the client supplied.
    pub name: String,
}

impl Packet for LoginStart {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Login, Direction::Serverbound, 0x00)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.name = read_varint_prefixed_string(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint_prefixed_string(writer, &self.name)
    }
}

/// `Login, Serverbound, 0x01`: the encrypted shared secret and verify-token reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionResponse {
    /// RSA(upstreamPubKey, sharedSecret).
    pub encrypted_shared_secret: Vec<u8>,
    /// RSA(upstreamPubKey, verifyToken).
    pub encrypted_verify_token: Vec<u8>,
}

impl Packet for EncryptionResponse {
    fn id() -> PacketId {
        PacketId::new(ConnectionState::Login, Direction::Serverbound, 0x01)
    }

    fn read_body<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.encrypted_shared_secret = read_u16_prefixed_bytes(reader)?;
        self.encrypted_verify_token = read_u16_prefixed_bytes(reader)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u16_prefixed_bytes(writer, &self.encrypted_shared_secret)?;
        write_u16_prefixed_bytes(writer, &self.encrypted_verify_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_request_round_trips() {
        let packet = EncryptionRequest {
            server_id: "abc".to_owned(),
            public_key: vec![1, 2, 3, 4],
            verify_token: vec![9, 9, 9, 9],
        };
        let mut buf = Vec::new();
        packet.write_body(&mut buf).unwrap();
        let mut decoded = EncryptionRequest::default();
        let mut cursor = &buf[..];
        decoded.read_body(&mut cursor).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn login_success_round_trips() {
        let packet = LoginSuccess { uuid: "u-u-i-d".to_owned(), username: "Notch".to_owned() };
        let mut buf = Vec::new();
        packet.write_body(&mut buf).unwrap();
        let mut decoded = LoginSuccess::default();
        let mut cursor = &buf[..];
        decoded.read_body(&mut cursor).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn internal_proxy_error_reason_is_well_formed_json() {
        let disconnect = LoginDisconnect::internal_proxy_error();
        let trimmed = disconnect.json_reason.trim();
        assert!(trimmed.starts_with('{') && trimmed.ends_with('}'));
    }
}
