//! Cryptographic handshake helpers: RSA keypair generation and SPKI
//! encoding, the Java-style signed-hex auth digest, PKCS#1 v1.5
//! encrypt/decrypt, and the identity-server HTTPS calls.

pub mod client_encryption;
pub mod digest;
pub mod error;
pub mod keys;
pub mod mojang;
pub mod pkcs1;

pub use error::{AuthError, CryptError};

/// Bit length of the RSA keypair generated at startup.
pub const RSA_KEY_BITS: usize = 1024;

/// Length in bytes of the AES-128 shared secret / CFB8 key.
pub const SHARED_SECRET_LEN: usize = 16;
