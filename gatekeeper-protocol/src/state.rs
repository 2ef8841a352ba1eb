/// The four protocol states a session moves through.
///
/// Transitions are unidirectional: `Handshaking` -> {`Status`, `Login`};
/// `Login` -> `Play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Initial state; only the handshake packet is valid.
    Handshaking,
    /// Server-list ping; relay continues verbatim until either peer closes.
    Status,
    /// Crypto handshake in progress.
    Login,
    /// Normal relay after a successful login.
    Play,
}

impl ConnectionState {
    /// Human-readable name, used in log lines and protocol-error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Handshaking => "Handshaking",
            Self::Status => "Status",
            Self::Login => "Login",
            Self::Play => "Play",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
