//! Client-facing encryption context (CEM).
//!
//! Not exercised by the session script this crate ships (see the
//! intercept-only-upstream design decision): the connecting client is never
//! sent its own `EncryptionRequest`. These helpers are kept as the extension
//! point for a full-MITM session that negotiates independent keys with each
//! side, mirroring the shape of [`crate::mojang::MojangClient::has_joined`].

use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::{CryptError, digest::auth_digest, keys, pkcs1};

/// Per-connection state for negotiating encryption with the connecting client.
pub struct ClientEncryptionContext {
    server_id: String,
    encoded_public_key: Vec<u8>,
    private_key: RsaPrivateKey,
    verify_token: [u8; 16],
    shared_secret: Option<[u8; 16]>,
}

impl ClientEncryptionContext {
    /// Builds a fresh context with its own keypair, server ID, and verify token.
    ///
    /// # Errors
    /// Returns an error if key generation or SPKI encoding fails.
    pub fn new() -> Result<Self, CryptError> {
        let (private_key, public_key) = keys::generate_key_pair()?;
        let encoded_public_key = keys::encode_public_key_spki(&public_key)?;
        let server_id = keys::generate_server_id();
        let verify_token = keys::generate_random_bytes_16();

        Ok(Self {
            server_id,
            encoded_public_key,
            private_key,
            verify_token,
            shared_secret: None,
        })
    }

    /// Fields for the `EncryptionRequest` packet to send to the client.
    #[must_use]
    pub fn encryption_request_fields(&self) -> (&str, &[u8], &[u8; 16]) {
        (&self.server_id, &self.encoded_public_key, &self.verify_token)
    }

    /// Decrypts the client's `EncryptionResponse` payload and verifies its
    /// verify-token round trip, storing the shared secret on success.
    ///
    /// # Errors
    /// Returns [`CryptError::VerifyTokenMismatch`] if the returned verify
    /// token does not match what this context sent, or a decrypt error if the
    /// ciphertext is malformed.
    pub fn handle_encryption_response(
        &mut self,
        encrypted_shared_secret: &[u8],
        encrypted_verify_token: &[u8],
    ) -> Result<[u8; 16], CryptError> {
        let shared_secret_bytes = pkcs1::decrypt(&self.private_key, encrypted_shared_secret)?;
        let returned_verify_token = pkcs1::decrypt(&self.private_key, encrypted_verify_token)?;

        if !pkcs1::constant_time_eq(&self.verify_token, &returned_verify_token) {
            return Err(CryptError::VerifyTokenMismatch);
        }

        let shared_secret: [u8; 16] = shared_secret_bytes
            .try_into()
            .map_err(|_| CryptError::InvalidKeyFormat)?;
        self.shared_secret = Some(shared_secret);
        Ok(shared_secret)
    }

    /// Computes the auth digest this client's `hasJoined` check expects, once
    /// the shared secret is known.
    #[must_use]
    pub fn has_joined_digest(&self) -> Option<String> {
        self.shared_secret
            .map(|secret| auth_digest(&self.server_id, &secret, &self.encoded_public_key))
    }
}

/// Public-key re-export for callers that only need the `RsaPublicKey` type
/// without pulling in the whole `rsa` crate surface.
pub type PublicKey = RsaPublicKey;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_response_round_trips_and_verifies_token() {
        let mut ctx = ClientEncryptionContext::new().unwrap();
        let (_, public_key, verify_token) = ctx.encryption_request_fields();
        let public_key = keys::decode_public_key_spki(public_key).unwrap();
        let verify_token = *verify_token;

        let secret = keys::generate_random_bytes_16();
        let enc_secret = pkcs1::encrypt(&public_key, &secret).unwrap();
        let enc_token = pkcs1::encrypt(&public_key, &verify_token).unwrap();

        let resolved = ctx.handle_encryption_response(&enc_secret, &enc_token).unwrap();
        assert_eq!(resolved, secret);
        assert!(ctx.has_joined_digest().is_some());
    }

    #[test]
    fn encryption_response_rejects_wrong_verify_token() {
        let mut ctx = ClientEncryptionContext::new().unwrap();
        let (_, public_key, _) = ctx.encryption_request_fields();
        let public_key = keys::decode_public_key_spki(public_key).unwrap();

        let secret = keys::generate_random_bytes_16();
        let wrong_token = keys::generate_random_bytes_16();
        let enc_secret = pkcs1::encrypt(&public_key, &secret).unwrap();
        let enc_token = pkcs1::encrypt(&public_key, &wrong_token).unwrap();

        assert!(ctx.handle_encryption_response(&enc_secret, &enc_token).is_err());
    }
}
