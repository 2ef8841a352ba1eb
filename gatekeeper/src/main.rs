//! Intercepting proxy for Java Edition's ~1.7-era protocol: relays an
//! unencrypted client connection to an online-mode upstream server,
//! performing that server's login handshake on the client's behalf.

mod config;
mod handlers;
mod logging;
mod proxy;

use std::sync::Arc;

use gatekeeper_session::{GlobalEncryptionState, PacketRegistry};
use tokio::signal;

use crate::{config::GATEKEEPER_CONFIG, proxy::Proxy};

#[tokio::main]
async fn main() {
    logging::init(&GATEKEEPER_CONFIG.log_filter);

    let gem = Arc::new(
        GlobalEncryptionState::new(GATEKEEPER_CONFIG.username.clone(), GATEKEEPER_CONFIG.password.clone())
            .expect("failed to initialize the proxy's own encryption state"),
    );

    let mut registry = PacketRegistry::new();
    handlers::register(&mut registry);
    registry.freeze();

    let proxy = Arc::new(
        Proxy::new(&GATEKEEPER_CONFIG, gem, Arc::new(registry))
            .await
            .expect("failed to bind the configured listen address"),
    );

    let shutdown_target = proxy.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            log::info!("received shutdown signal, stopping accept loop");
            shutdown_target.shutdown();
        }
    });

    proxy.run().await;
}
