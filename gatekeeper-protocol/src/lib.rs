//! Wire framing, packet identity/dispatch types, and the concrete packet
//! layouts for the handshake/login/play states this proxy touches.

pub mod direction;
pub mod error;
pub mod frame;
pub mod packet;
pub mod packet_id;
pub mod packets;
pub mod slot;
pub mod state;

pub use direction::Direction;
pub use error::PacketError;
pub use packet::Packet;
pub use packet_id::PacketId;
pub use slot::Slot;
pub use state::ConnectionState;

/// Default cap on a decoded frame's `body_len`; configurable via
/// [`frame::TCPNetworkDecoder::with_max_packet_size`].
pub const DEFAULT_MAX_PACKET_SIZE: usize = 2 * 1024 * 1024;
