//! RSA keypair generation and `SubjectPublicKeyInfo` encoding.

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePublicKey},
};

use crate::{CryptError, RSA_KEY_BITS};

/// Generates a fresh RSA keypair at the bit length required for the handshake.
///
/// # Errors
/// Returns an error if the underlying RNG or key generation fails.
pub fn generate_key_pair() -> Result<(RsaPrivateKey, RsaPublicKey), CryptError> {
    let mut rng = rand::rng();
    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)?;
    let public_key = RsaPublicKey::from(&private_key);
    Ok((private_key, public_key))
}

/// Encodes a public key as a DER `SubjectPublicKeyInfo` document with the
/// rsaEncryption OID (`1.2.840.113549.1.1.1`) and ASN.1 NULL parameters.
///
/// # Errors
/// Returns an error if DER encoding fails.
pub fn encode_public_key_spki(public_key: &RsaPublicKey) -> Result<Vec<u8>, CryptError> {
    Ok(public_key.to_public_key_der()?.into_vec())
}

/// Decodes a DER `SubjectPublicKeyInfo` document into an `RsaPublicKey`.
///
/// # Errors
/// Returns an error if the bytes are not a valid SPKI document for an RSA key.
pub fn decode_public_key_spki(der: &[u8]) -> Result<RsaPublicKey, CryptError> {
    RsaPublicKey::from_public_key_der(der).map_err(|_| CryptError::InvalidKeyFormat)
}

/// Generates the 20-byte handshake server ID, each byte remapped into the
/// printable range `0x30..0x6F`.
#[must_use]
pub fn generate_server_id() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 20];
    rand::rng().fill_bytes(&mut bytes);
    for byte in &mut bytes {
        *byte = (*byte & 0x3F) + 0x30;
    }
    // Every byte is in 0x30..=0x6F, a subset of printable ASCII.
    String::from_utf8(bytes.to_vec()).expect("remapped bytes are always valid ASCII")
}

/// Generates a fresh random 16-byte shared secret / verify token.
#[must_use]
pub fn generate_random_bytes_16() -> [u8; 16] {
    use rand::RngCore;

    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_id_bytes_are_in_printable_range() {
        for _ in 0..16 {
            let id = generate_server_id();
            assert_eq!(id.len(), 20);
            for byte in id.bytes() {
                assert!((0x30..=0x6F).contains(&byte));
            }
        }
    }

    #[test]
    fn spki_round_trips() {
        let (_, public_key) = generate_key_pair().unwrap();
        let encoded = encode_public_key_spki(&public_key).unwrap();
        let decoded = decode_public_key_spki(&encoded).unwrap();
        assert_eq!(public_key, decoded);
    }

    #[test]
    fn spki_uses_null_parameters_not_a_placeholder_string() {
        let (_, public_key) = generate_key_pair().unwrap();
        let encoded = encode_public_key_spki(&public_key).unwrap();
        // The AlgorithmIdentifier SEQUENCE contains the OID followed by the
        // NULL tag (0x05 0x00); a literal ASCII "foo" placeholder would never
        // appear as a two-byte NULL directly after the OID bytes.
        let oid = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
        let oid_pos = encoded
            .windows(oid.len())
            .position(|w| w == oid)
            .expect("rsaEncryption OID must be present");
        assert_eq!(&encoded[oid_pos + oid.len()..oid_pos + oid.len() + 2], [0x05, 0x00]);
    }
}
