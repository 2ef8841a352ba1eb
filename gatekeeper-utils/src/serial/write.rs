use std::io::{self, Write};

use super::WriteTo;
use crate::codec::VarInt;

macro_rules! impl_write_to_be {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WriteTo for $ty {
                fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
                    writer.write_all(&self.to_be_bytes())
                }
            }
        )*
    };
}

impl_write_to_be!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl WriteTo for bool {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        u8::from(*self).write_to(writer)
    }
}

/// Writes a `varint length ∥ UTF-8 bytes` string.
///
/// # Errors
/// Returns any I/O error from the underlying writer.
pub fn write_varint_prefixed_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let len = VarInt::try_from(value.len()).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
    len.write_sync(writer)?;
    writer.write_all(value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_big_endian_primitives() {
        let mut buf = Vec::new();
        256u32.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn writes_prefixed_string() {
        let mut buf = Vec::new();
        write_varint_prefixed_string(&mut buf, "hello").unwrap();
        assert_eq!(buf, {
            let mut expected = vec![5];
            expected.extend_from_slice(b"hello");
            expected
        });
    }
}
