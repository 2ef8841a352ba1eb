use gatekeeper_protocol::{PacketError, PacketId};
use thiserror::Error;

/// Errors that can terminate a single session. Never fatal to the proxy
/// itself — the listener logs these and moves on to the next connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A socket died, hit EOF mid-frame, or a write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Framing or field-level decode failure.
    #[error(transparent)]
    Packet(#[from] PacketError),
    /// RSA decrypt failure or a verify-token mismatch.
    #[error(transparent)]
    Crypto(#[from] gatekeeper_crypto::CryptError),
    /// The identity server rejected or could not service a request.
    #[error(transparent)]
    Auth(#[from] gatekeeper_crypto::AuthError),
    /// A received packet violated the session script (unexpected number,
    /// invalid `next_state`, a frame that doesn't fit the protocol grammar).
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl SessionError {
    /// A received packet's number did not match what the session script was
    /// waiting for next.
    #[must_use]
    pub fn unexpected_packet(got: PacketId, expected: PacketId) -> Self {
        Self::Packet(PacketError::UnexpectedPacket { got, expected })
    }
}
