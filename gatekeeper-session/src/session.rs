//! The session state machine (C4): drives one connection's handshake and
//! login scripts, then hands off to the relay (C5). Also the dispatch-facing
//! context passed into every registered handler.

use std::time::Duration;

use gatekeeper_crypto::{digest::auth_digest, keys, pkcs1};
use gatekeeper_protocol::{
    ConnectionState, Direction, Packet, PacketId,
    frame::{TCPNetworkDecoder, TCPNetworkEncoder},
    packets::{EncryptionRequest, EncryptionResponse, Handshake, LoginDisconnect, LoginStart, LoginSuccess},
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{SessionError, gem::GlobalEncryptionState, timeout::read_frame_timed};

/// A packet injected by a handler via [`Session::send`], queued for the
/// relay's dispatcher to serialize and route.
pub(crate) struct Outbound {
    pub direction: Direction,
    pub number: i32,
    pub payload: Vec<u8>,
}

/// The dispatch-facing context passed to every registered handler.
///
/// Cached handshake/login fields and the current protocol state live here;
/// the codecs and crypto contexts that drive the wire are owned locally by
/// the task running [`run_session`] and never exposed to handlers directly.
pub struct Session {
    /// The session's current protocol state.
    pub state: ConnectionState,
    /// The client's declared protocol version, echoed back, never validated.
    pub protocol_version: i32,
    /// The address the connecting client believes it reached.
    pub declared_address: String,
    /// The port the connecting client believes it reached.
    pub declared_port: u16,
    /// The player name from `LoginStart`, once received.
    pub player_name: Option<String>,
    /// The authenticated UUID from `LoginSuccess`, once parsed.
    pub uuid: Option<Uuid>,
    inject_tx: Option<mpsc::Sender<Outbound>>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            state: ConnectionState::Handshaking,
            protocol_version: 0,
            declared_address: String::new(),
            declared_port: 0,
            player_name: None,
            uuid: None,
            inject_tx: None,
        }
    }

    /// A session with no live inject channel, for registry/handler unit tests.
    #[cfg(test)]
    #[must_use]
    pub fn for_test() -> Self {
        Self::new()
    }

    pub(crate) fn attach_inject_channel(&mut self, tx: mpsc::Sender<Outbound>) {
        self.inject_tx = Some(tx);
    }

    /// Fabricates a packet of type `P` and enqueues it for the relay to
    /// serialize and route to whichever side `P::id().direction` names.
    ///
    /// Handlers are synchronous, so a full inject queue is not backpressured
    /// onto the caller: the packet is dropped and a warning logged rather
    /// than blocking the dispatcher.
    ///
    /// # Errors
    /// Returns an error if called before the relay has started, if encoding
    /// fails, or if the inject queue has already been torn down.
    pub fn send<P: Packet>(&self, packet: &P) -> Result<(), SessionError> {
        let Some(tx) = &self.inject_tx else {
            return Err(SessionError::Protocol(
                "Session::send called before the relay started accepting injections".to_owned(),
            ));
        };

        let mut payload = Vec::new();
        packet.write_body(&mut payload)?;
        let id = P::id();

        match tx.try_send(Outbound { direction: id.direction, number: id.number, payload }) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("inject queue full, dropping injected {id}");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(SessionError::Protocol(format!("inject queue closed while sending {id}")))
            }
        }
    }
}

async fn read_packet<R, P>(decoder: &mut TCPNetworkDecoder<R>, read_timeout: Option<Duration>) -> Result<P, SessionError>
where
    R: AsyncRead + Unpin + Send,
    P: Packet,
{
    let frame = read_frame_timed(decoder, read_timeout).await?;
    let expected = P::id();
    if frame.number != expected.number {
        let got = PacketId::new(expected.state, expected.direction, frame.number);
        return Err(SessionError::unexpected_packet(got, expected));
    }

    let mut packet = P::default();
    packet.read_body(&mut &frame.payload[..])?;
    Ok(packet)
}

async fn write_packet<W, P>(encoder: &mut TCPNetworkEncoder<W>, packet: &P) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin + Send,
    P: Packet,
{
    let mut body = Vec::new();
    packet.write_body(&mut body)?;
    encoder.write_frame(P::id().number, &body).await?;
    Ok(())
}

/// Runs step 1 of §4.4: receives the client's handshake, caches the fields
/// the rest of the script needs, rewrites the declared address/port to the
/// real upstream so virtual-hosting servers route correctly, and forwards it
/// on. Returns the state the session must transition to next.
///
/// # Errors
/// Returns [`SessionError::Protocol`] if `next_state` is not `1` or `2`, or
/// any I/O/codec error from either side.
pub async fn run_handshake<CR, SW>(
    client_decoder: &mut TCPNetworkDecoder<CR>,
    server_encoder: &mut TCPNetworkEncoder<SW>,
    session: &mut Session,
    upstream_host: &str,
    upstream_port: u16,
    read_timeout: Option<Duration>,
) -> Result<ConnectionState, SessionError>
where
    CR: AsyncRead + Unpin + Send,
    SW: AsyncWrite + Unpin + Send,
{
    let handshake: Handshake = read_packet(client_decoder, read_timeout).await?;

    session.protocol_version = handshake.protocol_version;
    session.declared_address = handshake.server_address.clone();
    session.declared_port = handshake.server_port;

    let next_state = match handshake.next_state {
        1 => ConnectionState::Status,
        2 => ConnectionState::Login,
        other => return Err(SessionError::Protocol(format!("invalid handshake next_state {other}"))),
    };

    let rewritten = Handshake {
        protocol_version: handshake.protocol_version,
        server_address: upstream_host.to_owned(),
        server_port: upstream_port,
        next_state: handshake.next_state,
    };
    write_packet(server_encoder, &rewritten).await?;

    session.state = next_state;
    Ok(next_state)
}

/// Runs the Login-state script of §4.4, steps 1-9: forwards `LoginStart`,
/// authenticates this proxy's account against the identity server, completes
/// the upstream's RSA encryption challenge, enables encryption on the
/// server-facing codec, and forwards `LoginSuccess` to the (still
/// plaintext) client.
///
/// On any error, attempts to send the client a state-appropriate
/// `Disconnect` before propagating, per §4.4's error-handling contract.
///
/// # Errors
/// Returns a [`SessionError`] variant for whichever step failed; the client
/// has already been sent a best-effort `Disconnect` frame by the time this
/// returns an error.
pub async fn run_login<CR, CW, SR, SW>(
    client_decoder: &mut TCPNetworkDecoder<CR>,
    client_encoder: &mut TCPNetworkEncoder<CW>,
    server_decoder: &mut TCPNetworkDecoder<SR>,
    server_encoder: &mut TCPNetworkEncoder<SW>,
    session: &mut Session,
    gem: &GlobalEncryptionState,
    read_timeout: Option<Duration>,
) -> Result<(), SessionError>
where
    CR: AsyncRead + Unpin + Send,
    CW: AsyncWrite + Unpin + Send,
    SR: AsyncRead + Unpin + Send,
    SW: AsyncWrite + Unpin + Send,
{
    match run_login_inner(client_decoder, client_encoder, server_decoder, server_encoder, session, gem, read_timeout).await {
        Ok(()) => Ok(()),
        Err(error) => {
            let disconnect = LoginDisconnect::internal_proxy_error();
            if let Err(send_error) = write_packet(client_encoder, &disconnect).await {
                log::warn!("failed to deliver login-disconnect to client: {send_error}");
            }
            Err(error)
        }
    }
}

async fn run_login_inner<CR, CW, SR, SW>(
    client_decoder: &mut TCPNetworkDecoder<CR>,
    client_encoder: &mut TCPNetworkEncoder<CW>,
    server_decoder: &mut TCPNetworkDecoder<SR>,
    server_encoder: &mut TCPNetworkEncoder<SW>,
    session: &mut Session,
    gem: &GlobalEncryptionState,
    read_timeout: Option<Duration>,
) -> Result<(), SessionError>
where
    CR: AsyncRead + Unpin + Send,
    CW: AsyncWrite + Unpin + Send,
    SR: AsyncRead + Unpin + Send,
    SW: AsyncWrite + Unpin + Send,
{
    let login_start: LoginStart = read_packet(client_decoder, read_timeout).await?;
    session.player_name = Some(login_start.name.clone());
    write_packet(server_encoder, &login_start).await?;

    let auth = gem.authenticate().await?;

    let encryption_request: EncryptionRequest = read_packet(server_decoder, read_timeout).await?;
    let upstream_public_key = keys::decode_public_key_spki(&encryption_request.public_key)?;

    let shared_secret = keys::generate_random_bytes_16();

    let digest = auth_digest(&encryption_request.server_id, &shared_secret, &encryption_request.public_key);
    gem.mojang.join(&auth.access_token, &auth.selected_profile_id, &digest).await?;

    let encrypted_shared_secret = pkcs1::encrypt(&upstream_public_key, &shared_secret)?;
    let encrypted_verify_token = pkcs1::encrypt(&upstream_public_key, &encryption_request.verify_token)?;
    let encryption_response = EncryptionResponse { encrypted_shared_secret, encrypted_verify_token };
    write_packet(server_encoder, &encryption_response).await?;

    server_encoder.set_encryption(&shared_secret);
    server_decoder.set_encryption(&shared_secret);

    let login_success: LoginSuccess = read_packet(server_decoder, read_timeout).await?;
    session.player_name = Some(login_success.username.clone());
    session.uuid = Uuid::parse_str(&login_success.uuid).ok();
    write_packet(client_encoder, &login_success).await?;

    session.state = ConnectionState::Play;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_send_without_relay_errors() {
        use gatekeeper_protocol::packets::ChatMessageClientbound;

        let session = Session::for_test();
        let packet = ChatMessageClientbound { json_data: "{}".to_owned() };
        assert!(session.send(&packet).is_err());
    }

    #[test]
    fn session_send_enqueues_once_relay_attached() {
        use gatekeeper_protocol::packets::ChatMessageClientbound;

        let mut session = Session::for_test();
        let (tx, mut rx) = mpsc::channel(4);
        session.attach_inject_channel(tx);

        let packet = ChatMessageClientbound { json_data: r#"{"text":"hi"}"#.to_owned() };
        session.send(&packet).unwrap();

        let outbound = rx.try_recv().unwrap();
        assert_eq!(outbound.direction, Direction::Clientbound);
        assert_eq!(outbound.number, ChatMessageClientbound::id().number);
    }
}
