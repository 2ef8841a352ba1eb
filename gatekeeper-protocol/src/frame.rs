//! The per-side wire codec: length-prefixed framing with the CFB8 encryption
//! upgrade.
//!
//! Encryption is a one-way transition (§4.1): once `set_encryption` returns,
//! every subsequent byte read or written on that side — including the
//! length-prefix varint of later frames — passes through AES-128 CFB8 keyed
//! by the shared secret, with the same secret reused as the IV.

use aes::Aes128;
use cfb8::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, generic_array::GenericArray};
use gatekeeper_utils::{codec::VarInt, front_vec::FrontVec};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{DEFAULT_MAX_PACKET_SIZE, PacketError};

type Aes128Cfb8Enc = cfb8::Encryptor<Aes128>;
type Aes128Cfb8Dec = cfb8::Decryptor<Aes128>;

/// A decoded frame's packet number and raw field bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// The packet number read from the frame body.
    pub number: i32,
    /// The remaining body bytes, after the packet-number varint.
    pub payload: Vec<u8>,
}

fn encrypt_byte(enc: &mut Aes128Cfb8Enc, byte: &mut u8) {
    let mut block = GenericArray::clone_from_slice(std::slice::from_ref(byte));
    enc.encrypt_block_mut(&mut block);
    *byte = block[0];
}

fn decrypt_byte(dec: &mut Aes128Cfb8Dec, byte: &mut u8) {
    let mut block = GenericArray::clone_from_slice(std::slice::from_ref(byte));
    dec.decrypt_block_mut(&mut block);
    *byte = block[0];
}

/// Reads length-prefixed frames from one side of a session, applying CFB8
/// decryption once enabled.
pub struct TCPNetworkDecoder<R> {
    reader: R,
    decryptor: Option<Aes128Cfb8Dec>,
    max_packet_size: usize,
}

impl<R: AsyncRead + Unpin + Send> TCPNetworkDecoder<R> {
    /// Wraps `reader` with the default max frame size.
    pub const fn new(reader: R) -> Self {
        Self { reader, decryptor: None, max_packet_size: DEFAULT_MAX_PACKET_SIZE }
    }

    /// Overrides the maximum accepted frame length.
    #[must_use]
    pub const fn with_max_packet_size(mut self, max_packet_size: usize) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }

    /// Enables CFB8 decryption on this side. One-way: calling this twice panics.
    ///
    /// # Panics
    /// Panics if encryption was already enabled.
    pub fn set_encryption(&mut self, key: &[u8; 16]) {
        assert!(self.decryptor.is_none(), "decryption already enabled for this side");
        self.decryptor =
            Some(Aes128Cfb8Dec::new_from_slices(key, key).expect("16-byte key/IV is always valid for AES-128"));
    }

    async fn read_u8_raw(&mut self) -> std::io::Result<u8> {
        let mut byte = self.reader.read_u8().await?;
        if let Some(dec) = &mut self.decryptor {
            decrypt_byte(dec, &mut byte);
        }
        Ok(byte)
    }

    async fn read_exact_raw(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.reader.read_exact(buf).await?;
        if let Some(dec) = &mut self.decryptor {
            for byte in buf.iter_mut() {
                decrypt_byte(dec, byte);
            }
        }
        Ok(())
    }

    async fn read_varint_raw(&mut self) -> std::io::Result<VarInt> {
        let mut value: i32 = 0;
        let mut position = 0;
        loop {
            let current = self.read_u8_raw().await?;
            value |= i32::from(current & 0x7F) << position;
            if current & 0x80 == 0 {
                break;
            }
            position += 7;
            if position >= 32 {
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "VarInt too large"));
            }
        }
        Ok(VarInt(value))
    }

    /// Reads one full frame: the length-prefix varint, the body, and splits
    /// the packet-number varint back off the front of the body.
    ///
    /// # Errors
    /// Returns [`PacketError::FrameTooLarge`] if the declared length exceeds
    /// the configured cap, [`PacketError::Io`] on any I/O failure or EOF.
    pub async fn read_frame(&mut self) -> Result<RawPacket, PacketError> {
        let VarInt(len) = self.read_varint_raw().await?;
        let len = usize::try_from(len).map_err(|_| {
            PacketError::MalformedValue(format!("negative frame length {len}"))
        })?;
        if len > self.max_packet_size {
            return Err(PacketError::FrameTooLarge { declared: len, max: self.max_packet_size });
        }

        let mut body = vec![0u8; len];
        self.read_exact_raw(&mut body).await?;

        let mut cursor = &body[..];
        let VarInt(number) = VarInt::read_sync(&mut cursor)?;
        let consumed = body.len() - cursor.len();
        let payload = body.split_off(consumed);

        Ok(RawPacket { number, payload })
    }
}

/// Writes length-prefixed frames to one side of a session, applying CFB8
/// encryption once enabled.
pub struct TCPNetworkEncoder<W> {
    writer: W,
    encryptor: Option<Aes128Cfb8Enc>,
}

impl<W: AsyncWrite + Unpin + Send> TCPNetworkEncoder<W> {
    /// Wraps `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer, encryptor: None }
    }

    /// Enables CFB8 encryption on this side. One-way: calling this twice panics.
    ///
    /// # Panics
    /// Panics if encryption was already enabled.
    pub fn set_encryption(&mut self, key: &[u8; 16]) {
        assert!(self.encryptor.is_none(), "encryption already enabled for this side");
        self.encryptor =
            Some(Aes128Cfb8Enc::new_from_slices(key, key).expect("16-byte key/IV is always valid for AES-128"));
    }

    /// Writes one frame given an already-encoded packet number and body.
    ///
    /// # Errors
    /// Returns any I/O error from the underlying writer.
    pub async fn write_frame(&mut self, number: i32, payload: &[u8]) -> Result<(), PacketError> {
        let number_size = VarInt(number).written_size();
        let body_len = number_size + payload.len();

        let mut buf = FrontVec::capacity(VarInt::MAX_SIZE, body_len);
        VarInt(number).write_sync(&mut buf)?;
        buf.extend_from_slice(payload);

        let frame_len = VarInt::try_from(buf.len())
            .map_err(|_| PacketError::MalformedValue("packet body too large to frame".to_owned()))?;
        frame_len.set_in_front(&mut buf);

        if let Some(enc) = &mut self.encryptor {
            for byte in buf.as_mut_slice() {
                encrypt_byte(enc, byte);
            }
        }

        self.writer.write_all(buf.as_slice()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Writes a frame whose body bytes (packet number included) are already
    /// fully assembled — used to relay an unmodified frame verbatim.
    ///
    /// # Errors
    /// Returns any I/O error from the underlying writer.
    pub async fn write_raw_body(&mut self, body: &[u8]) -> Result<(), PacketError> {
        let frame_len = VarInt::try_from(body.len())
            .map_err(|_| PacketError::MalformedValue("packet body too large to frame".to_owned()))?;

        let mut buf = FrontVec::capacity(VarInt::MAX_SIZE, body.len());
        buf.extend_from_slice(body);
        frame_len.set_in_front(&mut buf);

        if let Some(enc) = &mut self.encryptor {
            for byte in buf.as_mut_slice() {
                encrypt_byte(enc, byte);
            }
        }

        self.writer.write_all(buf.as_slice()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn plain_frame_round_trips() {
        let mut out = Vec::new();
        {
            let mut encoder = TCPNetworkEncoder::new(&mut out);
            encoder.write_frame(0x01, b"hello").await.unwrap();
        }

        let mut decoder = TCPNetworkDecoder::new(Cursor::new(out));
        let frame = decoder.read_frame().await.unwrap();
        assert_eq!(frame.number, 0x01);
        assert_eq!(frame.payload, b"hello");
    }

    #[tokio::test]
    async fn encrypted_frames_round_trip_across_multiple_reads() {
        let key = [5u8; 16];
        let mut out = Vec::new();
        {
            let mut encoder = TCPNetworkEncoder::new(&mut out);
            encoder.set_encryption(&key);
            encoder.write_frame(0x02, b"first").await.unwrap();
            encoder.write_frame(0x03, b"second-packet").await.unwrap();
        }

        let mut decoder = TCPNetworkDecoder::new(Cursor::new(out));
        decoder.set_encryption(&key);

        let first = decoder.read_frame().await.unwrap();
        assert_eq!(first.number, 0x02);
        assert_eq!(first.payload, b"first");

        let second = decoder.read_frame().await.unwrap();
        assert_eq!(second.number, 0x03);
        assert_eq!(second.payload, b"second-packet");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let mut bytes = Vec::new();
        VarInt(10_000_000).write_sync(&mut bytes).unwrap();
        let mut decoder = TCPNetworkDecoder::new(Cursor::new(bytes)).with_max_packet_size(1024);
        assert!(matches!(decoder.read_frame().await, Err(PacketError::FrameTooLarge { .. })));
    }

    #[tokio::test]
    async fn truncated_frame_is_an_io_error() {
        let mut bytes = Vec::new();
        VarInt(10).write_sync(&mut bytes).unwrap();
        bytes.extend_from_slice(b"short");
        let mut decoder = TCPNetworkDecoder::new(Cursor::new(bytes));
        assert!(matches!(decoder.read_frame().await, Err(PacketError::Io(_))));
    }

    #[test]
    #[should_panic(expected = "decryption already enabled")]
    fn enabling_decryption_twice_panics() {
        let mut decoder = TCPNetworkDecoder::new(Cursor::new(Vec::<u8>::new()));
        decoder.set_encryption(&[0u8; 16]);
        decoder.set_encryption(&[0u8; 16]);
    }
}
