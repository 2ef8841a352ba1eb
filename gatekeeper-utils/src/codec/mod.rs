//! Wire-level primitive codecs: the varint encoding used for frame lengths,
//! packet numbers, and string length prefixes.

mod var_int;

pub use var_int::VarInt;
