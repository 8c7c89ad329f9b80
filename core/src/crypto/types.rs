use thiserror::Error;

/// AES-256-GCM key length.
pub const KEY_LEN_32: usize = 32;

/// Standard 12-byte AES-GCM nonce (IV) length.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// IV salt length carried per sender.
pub const IV_SALT_LEN: usize = 16;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceError {
    /// Salt is invalid (all zeros).
    #[error("invalid salt: all zeros")]
    InvalidSalt,

    /// Frame counter cannot advance without reusing an IV.
    #[error("frame counter exhausted")]
    CounterExhausted,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid key length provided to cipher or KDF.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length mismatch (must be 12 bytes).
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// AEAD tag mismatch (tampering or wrong key).
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// HKDF could not produce the requested output.
    #[error("key derivation failed: {0}")]
    Kdf(String),

    /// General runtime error with context.
    #[error("crypto failure: {0}")]
    Failure(String),
}

impl From<NonceError> for CryptoError {
    fn from(e: NonceError) -> Self {
        CryptoError::Failure(e.to_string())
    }
}
