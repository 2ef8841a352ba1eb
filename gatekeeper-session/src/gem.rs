//! Process-wide encryption state (GEM): the proxy's own RSA identity, its
//! handshake server ID, the upstream account credentials, and the identity
//! server client. Created once at startup and shared read-only by every
//! session via `Arc`.

use gatekeeper_crypto::{CryptError, keys, mojang::MojangClient};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Immutable, process-wide state shared by every session.
pub struct GlobalEncryptionState {
    /// The proxy's own keypair. Unused by the intercept-only-upstream script
    /// (see the crate-level design notes); kept so a full-MITM session
    /// script has a shared identity to issue `EncryptionRequest`s from,
    /// rather than generating a fresh keypair per connection.
    pub private_key: RsaPrivateKey,
    /// Public half of [`Self::private_key`].
    pub public_key: RsaPublicKey,
    /// DER `SubjectPublicKeyInfo` encoding of [`Self::public_key`].
    pub encoded_public_key: Vec<u8>,
    /// The handshake nonce this proxy would present as a server, were it
    /// driving a full-MITM client-facing handshake.
    pub server_id: String,
    /// The upstream game account this proxy authenticates as, on behalf of
    /// every connecting player.
    username: String,
    password: String,
    /// Shared HTTPS client for the identity-server calls.
    pub mojang: MojangClient,
}

impl GlobalEncryptionState {
    /// Builds the process-wide state: generates the proxy's own keypair and
    /// server ID once, and stores the upstream credentials it will
    /// authenticate with for every session.
    ///
    /// # Errors
    /// Returns an error if key generation or SPKI encoding fails.
    pub fn new(username: String, password: String) -> Result<Self, CryptError> {
        let (private_key, public_key) = keys::generate_key_pair()?;
        let encoded_public_key = keys::encode_public_key_spki(&public_key)?;
        let server_id = keys::generate_server_id();

        Ok(Self {
            private_key,
            public_key,
            encoded_public_key,
            server_id,
            username,
            password,
            mojang: MojangClient::new(),
        })
    }

    /// Authenticates this proxy's configured account against the identity
    /// server, returning the access token and profile subsequent `join`
    /// calls need.
    ///
    /// # Errors
    /// Returns [`gatekeeper_crypto::AuthError`] on transport failure or a
    /// non-2xx response.
    pub async fn authenticate(
        &self,
    ) -> Result<gatekeeper_crypto::mojang::AuthenticateResponse, gatekeeper_crypto::AuthError> {
        self.mojang.authenticate(&self.username, &self.password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_generates_distinct_identities() {
        let a = GlobalEncryptionState::new("a".to_owned(), "pw".to_owned()).unwrap();
        let b = GlobalEncryptionState::new("b".to_owned(), "pw".to_owned()).unwrap();
        assert_ne!(a.server_id, b.server_id);
        assert_ne!(a.encoded_public_key, b.encoded_public_key);
    }
}
