//! PKCS#1 v1.5 encrypt/decrypt wrappers and constant-time comparison.

use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use crate::CryptError;

/// Encrypts `data` under `public_key` using PKCS#1 v1.5 padding.
///
/// # Errors
/// Returns an error if the data is too long for the key or the RNG fails.
pub fn encrypt(public_key: &RsaPublicKey, data: &[u8]) -> Result<Vec<u8>, CryptError> {
    let mut rng = rand::rng();
    Ok(public_key.encrypt(&mut rng, Pkcs1v15Encrypt, data)?)
}

/// Decrypts `data` under `private_key` using PKCS#1 v1.5 padding.
///
/// # Errors
/// Returns an error if the ciphertext is malformed or padding validation fails.
pub fn decrypt(private_key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, CryptError> {
    Ok(private_key.decrypt(Pkcs1v15Encrypt, data)?)
}

/// Compares two byte slices for equality in constant time with respect to
/// their content (the length check is not constant-time, since differing
/// lengths are never a secret-dependent signal here).
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let (private_key, public_key) = generate_key_pair().unwrap();
        let secret = [7u8; 16];
        let ciphertext = encrypt(&public_key, &secret).unwrap();
        let decrypted = decrypt(&private_key, &ciphertext).unwrap();
        assert_eq!(decrypted, secret);
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let (_, public_key) = generate_key_pair().unwrap();
        let (other_private_key, _) = generate_key_pair().unwrap();
        let ciphertext = encrypt(&public_key, &[1, 2, 3, 4]).unwrap();
        assert!(decrypt(&other_private_key, &ciphertext).is_err());
    }

    #[test]
    fn constant_time_eq_detects_mismatch() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
