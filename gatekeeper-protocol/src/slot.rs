use std::io::{self, Read, Write};

use gatekeeper_utils::serial::{ReadFrom, WriteTo};

/// An inventory slot value: item id, count, damage, and an opaque NBT blob.
///
/// `item == 0xFFFF` is the sentinel for "empty slot" and short-circuits
/// decoding after only the item field. A non-empty slot with
/// `nbt_len == 0xFFFF` carries no NBT data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Slot {
    /// No item present.
    #[default]
    Empty,
    /// An item stack.
    Occupied {
        /// The item's numeric ID.
        item: u16,
        /// Stack count.
        count: u8,
        /// Damage/durability value.
        damage: u16,
        /// Opaque NBT blob, absent when the wire `nbt_len` was `0xFFFF`.
        nbt: Option<Vec<u8>>,
    },
}

const EMPTY_SENTINEL: u16 = 0xFFFF;
const NO_NBT_SENTINEL: u16 = 0xFFFF;

impl ReadFrom for Slot {
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let item = u16::read_from(reader)?;
        if item == EMPTY_SENTINEL {
            return Ok(Self::Empty);
        }

        let count = u8::read_from(reader)?;
        let damage = u16::read_from(reader)?;
        let nbt_len = u16::read_from(reader)?;

        let nbt = if nbt_len == NO_NBT_SENTINEL {
            None
        } else {
            let mut buf = vec![0u8; nbt_len as usize];
            reader.read_exact(&mut buf)?;
            Some(buf)
        };

        Ok(Self::Occupied { item, count, damage, nbt })
    }
}

impl WriteTo for Slot {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Self::Empty => EMPTY_SENTINEL.write_to(writer),
            Self::Occupied { item, count, damage, nbt } => {
                item.write_to(writer)?;
                count.write_to(writer)?;
                damage.write_to(writer)?;
                match nbt {
                    None => NO_NBT_SENTINEL.write_to(writer),
                    Some(bytes) => {
                        #[allow(clippy::cast_possible_truncation, reason = "NBT blobs here never exceed u16 range on this protocol era")]
                        let len = bytes.len() as u16;
                        len.write_to(writer)?;
                        writer.write_all(bytes)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_consumes_exactly_two_bytes() {
        let bytes = [0xFF, 0xFF, 0xAA, 0xBB];
        let mut cursor = &bytes[..];
        let slot = Slot::read_from(&mut cursor).unwrap();
        assert_eq!(slot, Slot::Empty);
        assert_eq!(cursor, &[0xAA, 0xBB]);
    }

    #[test]
    fn slot_with_no_nbt_consumes_seven_bytes_total() {
        let bytes = [0x00, 0x01, 0x02, 0x00, 0x03, 0xFF, 0xFF, 0x99];
        let mut cursor = &bytes[..];
        let slot = Slot::read_from(&mut cursor).unwrap();
        assert_eq!(
            slot,
            Slot::Occupied { item: 1, count: 2, damage: 3, nbt: None }
        );
        assert_eq!(cursor, &[0x99]);
    }

    #[test]
    fn slot_with_nbt_round_trips() {
        let slot = Slot::Occupied {
            item: 42,
            count: 1,
            damage: 0,
            nbt: Some(vec![1, 2, 3]),
        };
        let mut buf = Vec::new();
        slot.write_to(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let decoded = Slot::read_from(&mut cursor).unwrap();
        assert_eq!(decoded, slot);
    }
}
