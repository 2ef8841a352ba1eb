use thiserror::Error;

/// Errors from key generation, encoding, and PKCS#1 operations.
#[derive(Debug, Error)]
pub enum CryptError {
    /// The underlying `rsa` crate reported an error.
    #[error("RSA operation failed: {0}")]
    Rsa(#[from] rsa::Error),
    /// SPKI (PKCS#8) encoding or decoding failed.
    #[error("SPKI encoding failed: {0}")]
    Spki(#[from] rsa::pkcs8::spki::Error),
    /// The key material was not in the expected format.
    #[error("invalid key format")]
    InvalidKeyFormat,
    /// Verify-token round trip did not match the value this side originally sent.
    #[error("verify token mismatch")]
    VerifyTokenMismatch,
}

/// Errors from the identity-server HTTPS calls.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request could not be sent or the response could not be read.
    #[error("identity server request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The identity server responded with a non-2xx status.
    #[error("identity server returned status {0}")]
    FailedResponse(reqwest::StatusCode),
    /// The response body was not the JSON shape expected for this call.
    #[error("failed to parse identity server response: {0}")]
    FailedParse(#[from] serde_json::Error),
    /// `hasJoined` or `join` reported the session as unrecognized (bad credentials,
    /// banned account, or the join step never happened).
    #[error("player failed online-mode verification")]
    UnverifiedSession,
}
