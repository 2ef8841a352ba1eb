//! Session lifecycle: the packet registry (C2), process-wide encryption
//! state (GEM), the handshake/login state machine (C4), and the relay fan-out
//! (C5) that takes over once a session reaches `Play` or `Status`.

pub mod error;
pub mod gem;
pub mod registry;
pub mod relay;
pub mod session;
mod timeout;

pub use error::SessionError;
pub use gem::GlobalEncryptionState;
pub use registry::PacketRegistry;
pub use session::Session;

use std::sync::Arc;
use std::time::Duration;

use gatekeeper_protocol::{
    ConnectionState, DEFAULT_MAX_PACKET_SIZE,
    frame::{TCPNetworkDecoder, TCPNetworkEncoder},
};
use tokio::io::{AsyncRead, AsyncWrite};

/// Per-connection tunables threaded down from the proxy's own configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Cap on a single decoded frame's declared length, either side.
    pub max_packet_size: usize,
    /// Optional deadline on every individual frame read. `None` (the
    /// default) relies on the OS/TCP layer alone, matching the distilled
    /// source.
    pub read_timeout: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self { max_packet_size: DEFAULT_MAX_PACKET_SIZE, read_timeout: None }
    }
}

/// Drives one accepted connection end to end: the handshake, then either the
/// `Status` relay directly, or the full login script followed by the `Play`
/// relay.
///
/// `upstream_host`/`upstream_port` are written into the forwarded handshake
/// in place of whatever the connecting client declared, so that
/// virtual-hosting upstream servers route the connection correctly.
///
/// # Errors
/// Returns whatever step of the handshake, login, or relay failed first. The
/// client has already been sent a best-effort disconnect frame if the
/// failure happened during login (see [`session::run_login`]) or after the
/// session reached `Play` (see [`relay::run`]).
pub async fn run_session<CR, CW, SR, SW>(
    client_reader: CR,
    client_writer: CW,
    server_reader: SR,
    server_writer: SW,
    upstream_host: &str,
    upstream_port: u16,
    gem: Arc<GlobalEncryptionState>,
    registry: Arc<PacketRegistry>,
    limits: SessionLimits,
) -> Result<(), SessionError>
where
    CR: AsyncRead + Unpin + Send + 'static,
    CW: AsyncWrite + Unpin + Send + 'static,
    SR: AsyncRead + Unpin + Send + 'static,
    SW: AsyncWrite + Unpin + Send + 'static,
{
    let mut client_decoder = TCPNetworkDecoder::new(client_reader).with_max_packet_size(limits.max_packet_size);
    let mut client_encoder = TCPNetworkEncoder::new(client_writer);
    let mut server_decoder = TCPNetworkDecoder::new(server_reader).with_max_packet_size(limits.max_packet_size);
    let mut server_encoder = TCPNetworkEncoder::new(server_writer);

    let mut current_session = Session::new();

    let next_state = session::run_handshake(
        &mut client_decoder,
        &mut server_encoder,
        &mut current_session,
        upstream_host,
        upstream_port,
        limits.read_timeout,
    )
    .await?;

    if next_state == ConnectionState::Login {
        session::run_login(
            &mut client_decoder,
            &mut client_encoder,
            &mut server_decoder,
            &mut server_encoder,
            &mut current_session,
            &gem,
            limits.read_timeout,
        )
        .await?;
    }

    relay::run(
        client_decoder,
        client_encoder,
        server_decoder,
        server_encoder,
        current_session,
        registry,
        limits.read_timeout,
    )
    .await
}
