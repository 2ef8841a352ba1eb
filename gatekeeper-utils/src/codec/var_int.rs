use std::io::{self, Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::front_vec::FrontVec;

/// A variable-length-encoded 32-bit integer.
///
/// Encoding: 7 bits of payload per byte, little-endian group order, MSB of
/// each byte set if another byte follows. Values in the `i32`/`u32` range
/// never need more than 5 bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Maximum number of bytes a `VarInt` can occupy on the wire.
    pub const MAX_SIZE: usize = 5;

    /// Number of bytes `self` would take on the wire.
    #[must_use]
    pub const fn written_size(self) -> usize {
        let mut value = self.0 as u32;
        let mut size = 1;
        while value >= 0x80 {
            value >>= 7;
            size += 1;
        }
        size
    }

    /// Reads a `VarInt` from a synchronous reader.
    ///
    /// # Errors
    /// Returns an I/O error on short read, and `InvalidData` if the encoding
    /// exceeds [`Self::MAX_SIZE`] bytes without terminating.
    pub fn read_sync<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut value: i32 = 0;
        let mut position = 0;
        let mut byte = [0u8; 1];

        loop {
            reader.read_exact(&mut byte)?;
            let current = byte[0];
            value |= i32::from(current & 0x7F) << position;

            if current & 0x80 == 0 {
                break;
            }

            position += 7;
            if position >= 32 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt too large"));
            }
        }

        Ok(Self(value))
    }

    /// Writes `self` to a synchronous writer.
    ///
    /// # Errors
    /// Returns any I/O error from the underlying writer.
    pub fn write_sync<W: Write>(self, writer: &mut W) -> io::Result<()> {
        let mut value = self.0 as u32;

        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            writer.write_all(&[byte])?;
            if value == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Reads a `VarInt` from an async reader.
    ///
    /// # Errors
    /// Returns an I/O error on short read or EOF, and `InvalidData` if the
    /// encoding exceeds [`Self::MAX_SIZE`] bytes without terminating.
    pub async fn read_async<R: AsyncRead + Unpin + Send>(reader: &mut R) -> io::Result<Self> {
        let mut value: i32 = 0;
        let mut position = 0;

        loop {
            let current = reader.read_u8().await?;
            value |= i32::from(current & 0x7F) << position;

            if current & 0x80 == 0 {
                break;
            }

            position += 7;
            if position >= 32 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt too large"));
            }
        }

        Ok(Self(value))
    }

    /// Writes `self` to an async writer.
    ///
    /// # Errors
    /// Returns any I/O error from the underlying writer.
    pub async fn write_async<W: AsyncWrite + Unpin + Send>(self, writer: &mut W) -> io::Result<()> {
        let mut value = self.0 as u32;

        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            writer.write_u8(byte).await?;
            if value == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Encodes `self` and writes it into a `FrontVec`'s reserved front space.
    ///
    /// # Panics
    /// Panics if the `FrontVec` does not have enough reserved space left.
    pub fn set_in_front(self, buf: &mut FrontVec) {
        let mut bytes = [0u8; Self::MAX_SIZE];
        let mut cursor = &mut bytes[..];
        let mut written = 0;
        self.write_sync(&mut cursor).expect("writing to a byte slice cannot fail");
        written += Self::MAX_SIZE - cursor.len();
        buf.set_in_front(&bytes[..written]);
    }
}

impl From<VarInt> for i32 {
    fn from(value: VarInt) -> Self {
        value.0
    }
}

impl From<i32> for VarInt {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<VarInt> for usize {
    fn from(value: VarInt) -> Self {
        value.0 as Self
    }
}

impl TryFrom<usize> for VarInt {
    type Error = std::num::TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Ok(Self(i32::try_from(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: i32) {
        let mut buf = Vec::new();
        VarInt(value).write_sync(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let decoded = VarInt::read_sync(&mut cursor).unwrap();
        assert_eq!(decoded.0, value, "round trip mismatch for {value}");
        assert!(cursor.is_empty(), "leftover bytes after decoding {value}");
    }

    #[test]
    fn bijection_over_representative_values() {
        for value in [
            0,
            1,
            -1,
            127,
            128,
            255,
            300,
            i32::MAX,
            i32::MIN,
            -2147483648,
            2147483647,
        ] {
            round_trip(value);
        }
    }

    #[test]
    fn boundary_encodings_are_bit_exact() {
        let mut buf = Vec::new();
        VarInt(0).write_sync(&mut buf).unwrap();
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        VarInt(127).write_sync(&mut buf).unwrap();
        assert_eq!(buf, vec![0x7F]);

        buf.clear();
        VarInt(128).write_sync(&mut buf).unwrap();
        assert_eq!(buf, vec![0x80, 0x01]);
    }

    #[test]
    fn written_size_matches_actual_encoding() {
        for value in [0, 127, 128, 16_383, 16_384, i32::MAX, -1] {
            let mut buf = Vec::new();
            VarInt(value).write_sync(&mut buf).unwrap();
            assert_eq!(VarInt(value).written_size(), buf.len(), "size mismatch for {value}");
        }
    }

    #[test]
    fn rejects_overlong_encoding() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut cursor = &bytes[..];
        assert!(VarInt::read_sync(&mut cursor).is_err());
    }

    #[tokio::test]
    async fn async_round_trip() {
        let mut buf = Vec::new();
        VarInt(300).write_async(&mut buf).await.unwrap();
        let mut cursor = &buf[..];
        let decoded = VarInt::read_async(&mut cursor).await.unwrap();
        assert_eq!(decoded.0, 300);
    }
}
