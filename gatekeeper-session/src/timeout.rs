//! Optional per-read I/O deadline, threaded through the handshake, login,
//! and relay read loops. Disabled (`None`) by default, matching the
//! distilled source's reliance on bare TCP-level timeouts; settable through
//! the binary's config file.

use std::time::Duration;

use gatekeeper_protocol::{
    PacketError,
    frame::{RawPacket, TCPNetworkDecoder},
};
use tokio::io::AsyncRead;

/// Reads one frame, bounded by `deadline` if set.
///
/// # Errors
/// Returns [`PacketError::Io`] with [`std::io::ErrorKind::TimedOut`] if the
/// deadline elapses first, or whatever [`TCPNetworkDecoder::read_frame`]
/// itself returns.
pub(crate) async fn read_frame_timed<R>(
    decoder: &mut TCPNetworkDecoder<R>,
    deadline: Option<Duration>,
) -> Result<RawPacket, PacketError>
where
    R: AsyncRead + Unpin + Send,
{
    match deadline {
        Some(duration) => tokio::time::timeout(duration, decoder.read_frame())
            .await
            .unwrap_or_else(|_| Err(PacketError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out")))),
        None => decoder.read_frame().await,
    }
}
