//! The relay (C5): once the session script reaches `Play` (or `Status`,
//! which never runs a login script), frames flow between the two peers
//! through five concurrent tasks sharing a handful of bounded channels —
//! two readers, two writers, and the dispatcher that decides whether a
//! frame is forwarded unchanged or decoded, handed to the registry, and
//! re-encoded.

use std::sync::Arc;
use std::time::Duration;

use gatekeeper_protocol::{
    ConnectionState, Direction, Packet, PacketId,
    frame::{RawPacket, TCPNetworkDecoder, TCPNetworkEncoder},
    packets::PlayDisconnect,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::{
    SessionError,
    registry::PacketRegistry,
    session::{Outbound, Session},
    timeout::read_frame_timed,
};

/// Capacity of every inter-task channel, per the crate's concurrency model.
const CHANNEL_CAPACITY: usize = 10;

/// How long the dispatcher waits after either side closes before tearing the
/// relay down, giving the writer tasks a chance to flush whatever is still
/// queued for the peer that is still open.
const SHUTDOWN_LINGER: Duration = Duration::from_millis(500);

/// Runs the relay to completion: returns once either peer closes cleanly, or
/// propagates whichever of the five tasks errors first.
///
/// # Errors
/// Returns the first [`SessionError`] observed by any of the reader, writer,
/// or dispatcher tasks.
#[allow(clippy::too_many_arguments)]
pub async fn run<CR, CW, SR, SW>(
    mut client_decoder: TCPNetworkDecoder<CR>,
    mut client_encoder: TCPNetworkEncoder<CW>,
    mut server_decoder: TCPNetworkDecoder<SR>,
    mut server_encoder: TCPNetworkEncoder<SW>,
    mut session: Session,
    registry: Arc<PacketRegistry>,
    read_timeout: Option<Duration>,
) -> Result<(), SessionError>
where
    CR: AsyncRead + Unpin + Send + 'static,
    CW: AsyncWrite + Unpin + Send + 'static,
    SR: AsyncRead + Unpin + Send + 'static,
    SW: AsyncWrite + Unpin + Send + 'static,
{
    let (in_c_tx, mut in_c_rx) = mpsc::channel::<RawPacket>(CHANNEL_CAPACITY);
    let (in_s_tx, mut in_s_rx) = mpsc::channel::<RawPacket>(CHANNEL_CAPACITY);
    let (out_c_tx, mut out_c_rx) = mpsc::channel::<RawPacket>(CHANNEL_CAPACITY);
    let (out_s_tx, mut out_s_rx) = mpsc::channel::<RawPacket>(CHANNEL_CAPACITY);
    let (inject_tx, mut inject_rx) = mpsc::channel::<Outbound>(CHANNEL_CAPACITY);
    let (err_tx, mut err_rx) = mpsc::channel::<SessionError>(1);

    session.attach_inject_channel(inject_tx);

    // R_cs: client -> in_c
    tokio::spawn({
        let err_tx = err_tx.clone();
        async move {
            loop {
                match read_frame_timed(&mut client_decoder, read_timeout).await {
                    Ok(frame) => {
                        if in_c_tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        let _ = err_tx.try_send(SessionError::from(error));
                        return;
                    }
                }
            }
        }
    });

    // R_ss: server -> in_s
    tokio::spawn({
        let err_tx = err_tx.clone();
        async move {
            loop {
                match read_frame_timed(&mut server_decoder, read_timeout).await {
                    Ok(frame) => {
                        if in_s_tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        let _ = err_tx.try_send(SessionError::from(error));
                        return;
                    }
                }
            }
        }
    });

    // W_cs: out_c -> client
    tokio::spawn({
        let err_tx = err_tx.clone();
        async move {
            while let Some(frame) = out_c_rx.recv().await {
                if let Err(error) = client_encoder.write_frame(frame.number, &frame.payload).await {
                    let _ = err_tx.try_send(SessionError::from(error));
                    return;
                }
            }
        }
    });

    // W_ss: out_s -> server
    tokio::spawn({
        let err_tx = err_tx.clone();
        async move {
            while let Some(frame) = out_s_rx.recv().await {
                if let Err(error) = server_encoder.write_frame(frame.number, &frame.payload).await {
                    let _ = err_tx.try_send(SessionError::from(error));
                    return;
                }
            }
        }
    });

    // D: the dispatcher, run inline on this task.
    let result = loop {
        tokio::select! {
            biased;

            error = err_rx.recv() => {
                match error {
                    Some(error) => break Err(error),
                    None => continue,
                }
            }
            frame = in_c_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(error) = dispatch_frame(Direction::Serverbound, frame, &mut session, &registry, &out_s_tx).await {
                            break Err(error);
                        }
                    }
                    None => break Ok(()),
                }
            }
            frame = in_s_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(error) = dispatch_frame(Direction::Clientbound, frame, &mut session, &registry, &out_c_tx).await {
                            break Err(error);
                        }
                    }
                    None => break Ok(()),
                }
            }
            outbound = inject_rx.recv() => {
                let Some(outbound) = outbound else { continue };
                let target = match outbound.direction {
                    Direction::Clientbound => &out_c_tx,
                    Direction::Serverbound => &out_s_tx,
                };
                let _ = target.send(RawPacket { number: outbound.number, payload: outbound.payload }).await;
            }
        }
    };

    // A fatal error reached while the session had already entered Play owes
    // the client the same best-effort Disconnect the login script sends for
    // a failure during Login (§4.4/§7/§8's "Truncated frame" scenario).
    // Queued through out_c, same as any other clientbound frame, so it goes
    // out through W_cs ahead of the linger below.
    if result.is_err() && session.state == ConnectionState::Play {
        let disconnect = PlayDisconnect::internal_proxy_error();
        let mut body = Vec::new();
        if disconnect.write_body(&mut body).is_ok() {
            let _ = out_c_tx.send(RawPacket { number: PlayDisconnect::id().number, payload: body }).await;
        }
    }

    // Give the writer tasks a moment to flush whatever is still queued
    // for the peer that didn't just close, then let every channel drop.
    tokio::time::sleep(SHUTDOWN_LINGER).await;

    result
}

/// Looks up the packet's registered kind (if any). An unregistered ID is
/// forwarded byte-for-byte, unchanged; a registered one is decoded, run
/// through every handler, and re-encoded only if every handler voted to
/// accept it.
async fn dispatch_frame(
    origin: Direction,
    frame: RawPacket,
    session: &mut Session,
    registry: &PacketRegistry,
    forward_tx: &mpsc::Sender<RawPacket>,
) -> Result<(), SessionError> {
    let id = PacketId::new(session.state, origin, frame.number);

    let Some(mut packet) = registry.lookup(id) else {
        let _ = forward_tx.send(frame).await;
        return Ok(());
    };

    packet.decode(&frame.payload)?;
    let accept = registry.dispatch(session, &mut *packet);
    if accept {
        let mut body = Vec::new();
        packet.encode(&mut body)?;
        let _ = forward_tx.send(RawPacket { number: frame.number, payload: body }).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use gatekeeper_protocol::{ConnectionState, packets::ChatMessageServerbound};

    use super::*;

    #[tokio::test]
    async fn unregistered_packet_forwards_unchanged() {
        let registry = PacketRegistry::new();
        let mut session = Session::for_test();
        session.state = ConnectionState::Play;
        let (tx, mut rx) = mpsc::channel(4);

        let frame = RawPacket { number: ChatMessageServerbound::id().number, payload: b"\x02hi".to_vec() };
        dispatch_frame(Direction::Serverbound, frame.clone(), &mut session, &registry, &tx).await.unwrap();

        let forwarded = rx.try_recv().unwrap();
        assert_eq!(forwarded, frame);
    }

    #[tokio::test]
    async fn registered_packet_rejected_by_handler_is_dropped() {
        let mut registry = PacketRegistry::new();
        registry.register::<ChatMessageServerbound, _>(|_session, packet| !packet.message.starts_with('/'));
        registry.freeze();

        let mut session = Session::for_test();
        session.state = ConnectionState::Play;
        let (tx, mut rx) = mpsc::channel(4);

        let frame = RawPacket { number: ChatMessageServerbound::id().number, payload: b"\x06/greet".to_vec() };
        dispatch_frame(Direction::Serverbound, frame, &mut session, &registry, &tx).await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn registered_packet_accepted_by_handler_is_forwarded() {
        let mut registry = PacketRegistry::new();
        registry.register::<ChatMessageServerbound, _>(|_session, _packet| true);
        registry.freeze();

        let mut session = Session::for_test();
        session.state = ConnectionState::Play;
        let (tx, mut rx) = mpsc::channel(4);

        let frame = RawPacket { number: ChatMessageServerbound::id().number, payload: b"\x02hi".to_vec() };
        dispatch_frame(Direction::Serverbound, frame.clone(), &mut session, &registry, &tx).await.unwrap();

        let forwarded = rx.try_recv().unwrap();
        assert_eq!(forwarded, frame);
    }
}
