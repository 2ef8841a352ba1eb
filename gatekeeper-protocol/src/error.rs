use thiserror::Error;

/// Errors surfaced by the wire codec and packet layouts.
#[derive(Debug, Error)]
pub enum PacketError {
    /// The underlying stream failed or hit EOF mid-frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A frame's declared length exceeded the configured maximum.
    #[error("frame of {declared} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// The length the frame claimed.
        declared: usize,
        /// The configured cap.
        max: usize,
    },
    /// A field had a value outside its protocol-defined domain (e.g. an
    /// unrecognized `handshakeNextState`).
    #[error("malformed value: {0}")]
    MalformedValue(String),
    /// A received packet's number did not match what the caller expected to
    /// receive next in the login script.
    #[error("unexpected packet {got}, expected {expected}")]
    UnexpectedPacket {
        /// The packet ID that was actually received.
        got: crate::PacketId,
        /// The packet ID the caller was waiting for.
        expected: crate::PacketId,
    },
}
