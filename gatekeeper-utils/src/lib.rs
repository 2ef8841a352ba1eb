//! Low-level building blocks shared by the rest of the workspace: the varint
//! codec and the reserved-front-space buffer used when framing packets.

pub mod codec;
pub mod front_vec;
pub mod serial;
