use std::io;

use crate::PacketId;

/// A concrete, registrable packet layout.
///
/// Implementors are plain structs with a `Default` instance (used by the
/// registry to produce a fresh value to decode into) and report their own
/// fixed `PacketId`.
pub trait Packet: Default {
    /// This packet kind's identity.
    fn id() -> PacketId;

    /// Decodes `self`'s fields from `reader` (the packet-number varint has
    /// already been consumed by the caller).
    ///
    /// # Errors
    /// Returns an I/O error on short read or malformed field content.
    fn read_body<R: io::Read>(&mut self, reader: &mut R) -> io::Result<()>;

    /// Encodes `self`'s fields to `writer` (the packet-number varint is
    /// written by the caller, not by this method).
    ///
    /// # Errors
    /// Returns any I/O error from the underlying writer.
    fn write_body<W: io::Write>(&self, writer: &mut W) -> io::Result<()>;
}
