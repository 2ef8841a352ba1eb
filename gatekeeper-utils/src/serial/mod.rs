//! Synchronous binary (de)serialization traits used by packet field layouts.

mod read;
mod write;

use std::io;

/// Reads `Self` from a byte stream in the wire format described by the packet
/// tables.
pub trait ReadFrom: Sized {
    /// Reads a value.
    ///
    /// # Errors
    /// Returns an I/O error on short read or malformed content.
    fn read_from<R: io::Read>(reader: &mut R) -> io::Result<Self>;
}

/// Writes `Self` to a byte stream in the wire format described by the packet
/// tables.
pub trait WriteTo {
    /// Writes a value.
    ///
    /// # Errors
    /// Returns any I/O error from the underlying writer.
    fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()>;
}

pub use read::read_varint_prefixed_string;
pub use write::write_varint_prefixed_string;
