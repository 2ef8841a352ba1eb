//! The listener (C6): binds once, then spawns one independent session task
//! per accepted connection. A session's failure never takes down the proxy —
//! it's logged and the accept loop continues.

use std::sync::Arc;

use gatekeeper_session::{GlobalEncryptionState, PacketRegistry, SessionError, SessionLimits, run_session};
use tokio::{
    io::{BufReader, BufWriter},
    net::{TcpListener, TcpStream},
};
use tokio_util::sync::CancellationToken;

use crate::config::GatekeeperConfig;

/// Owns the listening socket and the state every session shares.
pub struct Proxy {
    listener: TcpListener,
    upstream_host: String,
    upstream_port: u16,
    limits: SessionLimits,
    gem: Arc<GlobalEncryptionState>,
    registry: Arc<PacketRegistry>,
    cancel_token: CancellationToken,
}

impl Proxy {
    /// Binds `config.listen_address`.
    ///
    /// # Errors
    /// Returns an error if the listener fails to bind.
    pub async fn new(
        config: &GatekeeperConfig,
        gem: Arc<GlobalEncryptionState>,
        registry: Arc<PacketRegistry>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen_address).await?;

        Ok(Self {
            listener,
            upstream_host: config.upstream_host.clone(),
            upstream_port: config.upstream_port,
            limits: SessionLimits { max_packet_size: config.max_packet_size, read_timeout: config.read_timeout() },
            gem,
            registry,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Runs the accept loop until [`Self::shutdown`] is called.
    pub async fn run(&self) {
        let local_addr = self.listener.local_addr().map_or_else(|_| "?".to_owned(), |addr| addr.to_string());
        log::info!("gatekeeper listening on {local_addr}, forwarding to {}:{}", self.upstream_host, self.upstream_port);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => break,
                accept_result = self.listener.accept() => {
                    let Ok((client_stream, address)) = accept_result else {
                        continue;
                    };
                    if let Err(error) = client_stream.set_nodelay(true) {
                        log::warn!("failed to set TCP_NODELAY for {address}: {error}");
                    }

                    let upstream_host = self.upstream_host.clone();
                    let upstream_port = self.upstream_port;
                    let gem = self.gem.clone();
                    let registry = self.registry.clone();
                    let limits = self.limits;

                    tokio::spawn(async move {
                        log::info!("accepted connection from {address}");
                        if let Err(error) =
                            handle_connection(client_stream, &upstream_host, upstream_port, gem, registry, limits).await
                        {
                            log::warn!("session with {address} ended: {error}");
                        } else {
                            log::info!("session with {address} closed");
                        }
                    });
                }
            }
        }
    }

    /// Signals the accept loop to stop after its current iteration.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

async fn handle_connection(
    client_stream: TcpStream,
    upstream_host: &str,
    upstream_port: u16,
    gem: Arc<GlobalEncryptionState>,
    registry: Arc<PacketRegistry>,
    limits: SessionLimits,
) -> Result<(), SessionError> {
    let server_stream = TcpStream::connect((upstream_host, upstream_port)).await?;
    if let Err(error) = server_stream.set_nodelay(true) {
        log::warn!("failed to set TCP_NODELAY on the upstream connection: {error}");
    }

    let (client_read, client_write) = client_stream.into_split();
    let (server_read, server_write) = server_stream.into_split();

    run_session(
        BufReader::new(client_read),
        BufWriter::new(client_write),
        BufReader::new(server_read),
        BufWriter::new(server_write),
        upstream_host,
        upstream_port,
        gem,
        registry,
        limits,
    )
    .await
}
