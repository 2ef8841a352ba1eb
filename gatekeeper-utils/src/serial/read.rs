use std::io::{self, Read};

use super::ReadFrom;
use crate::codec::VarInt;

macro_rules! impl_read_from_be {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ReadFrom for $ty {
                fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
                    let mut buf = [0u8; size_of::<$ty>()];
                    reader.read_exact(&mut buf)?;
                    Ok(<$ty>::from_be_bytes(buf))
                }
            }
        )*
    };
}

impl_read_from_be!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl ReadFrom for bool {
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(u8::read_from(reader)? != 0)
    }
}

/// Reads a fixed number of raw bytes.
///
/// # Errors
/// Returns an I/O error on short read.
pub fn read_exact_bytes<R: Read>(reader: &mut R, count: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads a `varint length ∥ UTF-8 bytes` string.
///
/// # Errors
/// Returns an I/O error on short read, or `InvalidData` if the bytes are not
/// valid UTF-8.
pub fn read_varint_prefixed_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let VarInt(len) = VarInt::read_sync(reader)?;
    let len = usize::try_from(len).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative string length"))?;
    let bytes = read_exact_bytes(reader, len)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let mut cursor = &[0x00, 0x00, 0x01, 0x00][..];
        assert_eq!(u32::read_from(&mut cursor).unwrap(), 256);
    }

    #[test]
    fn reads_prefixed_string() {
        let mut bytes = vec![5];
        bytes.extend_from_slice(b"hello");
        let mut cursor = &bytes[..];
        assert_eq!(read_varint_prefixed_string(&mut cursor).unwrap(), "hello");
    }
}
